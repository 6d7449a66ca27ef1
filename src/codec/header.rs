// Delta stream framing: fixed 10-byte header and checksum trailer.
//
// Layout (all fields little-endian u16):
//
//   0   magic 0x0D16
//   2   src_addr       base address of the source
//   4   src_len        length of the source in bytes
//   6   src_checksum   Fletcher-16 of the source
//   8   dst_addr       base address of the destination
//   10  instruction stream, terminated by a single END byte
//   -2  dst_checksum   Fletcher-16 of the destination

use super::decoder::DecodeError;
use crate::bytes::{addr16, pack16};

/// Stream magic, stored little-endian as `16 0d`.
pub const DELTA_MAGIC: u16 = 0x0d16;

/// Fixed header length in bytes.
pub const HEADER_LEN: usize = 10;

/// Smallest valid delta: header, END, destination checksum.
pub const MIN_DELTA_LEN: usize = HEADER_LEN + 1 + 2;

/// The fixed-size delta header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaHeader {
    pub src_addr: u16,
    pub src_len: u16,
    pub src_checksum: u16,
    pub dst_addr: u16,
}

impl DeltaHeader {
    /// Append the encoded header to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&pack16(DELTA_MAGIC));
        out.extend_from_slice(&pack16(self.src_addr));
        out.extend_from_slice(&pack16(self.src_len));
        out.extend_from_slice(&pack16(self.src_checksum));
        out.extend_from_slice(&pack16(self.dst_addr));
    }

    /// Parse the header at the front of `delta`, checking the magic and
    /// that the buffer can hold at least an empty delta.
    pub fn decode(delta: &[u8]) -> Result<Self, DecodeError> {
        if delta.len() < MIN_DELTA_LEN {
            return Err(DecodeError::Truncated { what: "header" });
        }
        let magic = addr16(&delta[0..]);
        if magic != DELTA_MAGIC {
            return Err(DecodeError::BadMagic { found: magic });
        }
        Ok(Self {
            src_addr: addr16(&delta[2..]),
            src_len: addr16(&delta[4..]),
            src_checksum: addr16(&delta[6..]),
            dst_addr: addr16(&delta[8..]),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let header = DeltaHeader {
            src_addr: 0x8000,
            src_len: 0x2000,
            src_checksum: 0x0627,
            dst_addr: 0x9000,
        };
        let mut out = Vec::new();
        header.encode(&mut out);
        out.extend_from_slice(&[0, 0, 0]); // END + trailer padding
        assert_eq!(out.len(), MIN_DELTA_LEN);
        assert_eq!(DeltaHeader::decode(&out).unwrap(), header);
    }

    #[test]
    fn magic_bytes_are_16_0d() {
        let mut out = Vec::new();
        DeltaHeader {
            src_addr: 0,
            src_len: 0,
            src_checksum: 0,
            dst_addr: 0,
        }
        .encode(&mut out);
        assert_eq!(&out[..2], &[0x16, 0x0d]);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let delta = [0xd6u8, 0xc3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            DeltaHeader::decode(&delta),
            Err(DecodeError::BadMagic { found: 0xc3d6 })
        );
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert_eq!(
            DeltaHeader::decode(&[0x16, 0x0d, 0, 0]),
            Err(DecodeError::Truncated { what: "header" })
        );
    }
}
