#![no_main]
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes as a delta against an arbitrary source: decoding may
// fail, but must never panic.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let payload = &data[1..];
    let split = (data[0] as usize).min(payload.len());
    let (source, delta) = payload.split_at(split);

    let _ = delta16::decode(source, 0, delta);
});
