// Byte-level primitives shared by the encoder and decoder.
//
// Every multi-byte value in the delta stream is a little-endian u16. The
// checksum is Fletcher-16 with both running sums folded as soon as they
// reach 255; the fold-at-255 threshold is part of the wire format.

/// Pack a 16-bit value as little-endian bytes.
#[inline]
pub fn pack16(n: u16) -> [u8; 2] {
    n.to_le_bytes()
}

/// Read a little-endian u16 from the front of `bytes`.
///
/// Callers must have at least two bytes available.
#[inline]
pub fn addr16(bytes: &[u8]) -> u16 {
    debug_assert!(bytes.len() >= 2);
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Fletcher-16 over `data`, folding each sum at 255.
pub fn fletcher16(data: &[u8]) -> u16 {
    let mut sum1: u16 = 0;
    let mut sum2: u16 = 0;
    for &byte in data {
        sum1 += u16::from(byte);
        if sum1 >= 255 {
            sum1 -= 255;
        }
        sum2 += sum1;
        if sum2 >= 255 {
            sum2 -= 255;
        }
    }
    (sum2 << 8) | sum1
}

/// Render bytes as space-separated hex pairs, for trace output.
pub fn hexstring(data: &[u8]) -> String {
    data.iter()
        .map(|v| format!("{v:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
