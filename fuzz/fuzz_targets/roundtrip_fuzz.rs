#![no_main]
use delta16::{EncodeOptions, decode, encode_with_options};
use libfuzzer_sys::fuzz_target;

// Split the input into source and target, encode, decode, and require the
// exact target back.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let block_size = 1 + (data[0] as usize & 0x3f);
    let payload = &data[1..];
    let split = payload.len() / 2;
    let (source, target) = payload.split_at(split);

    let opts = EncodeOptions {
        block_size,
        ..Default::default()
    };
    let delta = encode_with_options(source, 0, target, &opts).unwrap();
    let decoded = decode(source, 0, &delta).unwrap();
    assert_eq!(decoded, target);
});
