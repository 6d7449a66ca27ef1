// Delta engine: ties fragment discovery to stream encoding/decoding.
//
// Provides the high-level encode/decode APIs that orchestrate:
//   - Fragment search (matching module) to find aligned source regions
//   - Stream serialization (codec module) to produce the delta
//   - Two-pass decoding to reconstruct the destination from source + delta

use log::debug;
use thiserror::Error;

use crate::codec::decoder::{self, DecodeError};
use crate::codec::encoder;
use crate::matching::{self, DEFAULT_BLOCK_SIZE};

// ---------------------------------------------------------------------------
// Encode options
// ---------------------------------------------------------------------------

/// Configuration for delta encoding.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Base address of the destination. `None` means the source base.
    pub dst_addr: Option<u16>,
    /// Fragment search granularity; also the minimum accepted fragment
    /// length.
    pub block_size: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            dst_addr: None,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder error
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("source does not fit the 16-bit address space (base {addr:#06x}, {len} bytes)")]
    SourceOutOfRange { addr: u16, len: usize },

    #[error("destination does not fit the 16-bit address space (base {addr:#06x}, {len} bytes)")]
    DestinationOutOfRange { addr: u16, len: usize },
}

// ---------------------------------------------------------------------------
// High-level encode / decode
// ---------------------------------------------------------------------------

/// Encode a delta that rewrites `src` into `dst`, with both images based
/// at `src_addr`.
pub fn encode(src: &[u8], src_addr: u16, dst: &[u8]) -> Result<Vec<u8>, EncodeError> {
    encode_with_options(src, src_addr, dst, &EncodeOptions::default())
}

/// Encode with an explicit destination base address or block size.
pub fn encode_with_options(
    src: &[u8],
    src_addr: u16,
    dst: &[u8],
    opts: &EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    let dst_addr = opts.dst_addr.unwrap_or(src_addr);

    if src.len() > u16::MAX as usize || src_addr as usize + src.len() > 1 << 16 {
        return Err(EncodeError::SourceOutOfRange {
            addr: src_addr,
            len: src.len(),
        });
    }
    if dst.len() > u16::MAX as usize || dst_addr as usize + dst.len() > 1 << 16 {
        return Err(EncodeError::DestinationOutOfRange {
            addr: dst_addr,
            len: dst.len(),
        });
    }

    let fragments = matching::find_fragments(dst, src, opts.block_size);
    debug!(
        "encoding {} -> {} bytes across {} fragment(s)",
        src.len(),
        dst.len(),
        fragments.len()
    );
    Ok(encoder::encode_delta(src, src_addr, dst, dst_addr, fragments))
}

/// Apply a delta to `src`, reconstructing the destination.
pub fn decode(src: &[u8], src_addr: u16, delta: &[u8]) -> Result<Vec<u8>, DecodeError> {
    decoder::decode_delta(src, src_addr, delta)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(src: &[u8], dst: &[u8], block_size: usize) {
        let opts = EncodeOptions {
            block_size,
            ..Default::default()
        };
        let delta = encode_with_options(src, 0, dst, &opts).expect("encode failed");
        let reconstructed = decode(src, 0, &delta).expect("decode failed");
        assert_eq!(
            reconstructed,
            dst,
            "roundtrip mismatch (src={}, dst={}, delta={})",
            src.len(),
            dst.len(),
            delta.len()
        );
    }

    #[test]
    fn roundtrip_identical() {
        let data = b"the quick brown fox jumps over the lazy dog";
        roundtrip(data, data, 8);
    }

    #[test]
    fn roundtrip_swapped_phrases() {
        roundtrip(
            b"the quick brown fox jumps over the lazy dog",
            b"jumps over the lazy dog does the quick brown fox",
            8,
        );
    }

    #[test]
    fn roundtrip_no_shared_content() {
        roundtrip(b"completely different", b"unrelated destination", 8);
    }

    #[test]
    fn roundtrip_empty_inputs() {
        roundtrip(b"", b"", 64);
        roundtrip(b"", b"something from nothing", 64);
        roundtrip(b"something into nothing", b"", 64);
    }

    #[test]
    fn roundtrip_small_edit() {
        let src = b"Hello, world! This is a test of the delta engine.";
        let dst = b"Hello, earth! This is a test of the delta engine.";
        roundtrip(src, dst, 8);
    }

    #[test]
    fn nonzero_base_addresses() {
        let src = b"the quick brown fox jumps over the lazy dog";
        let dst = b"jumps over the lazy dog does the quick brown fox";
        let opts = EncodeOptions {
            dst_addr: Some(0x9000),
            block_size: 8,
        };
        let delta = encode_with_options(src, 0x8000, dst, &opts).unwrap();
        assert_eq!(decode(src, 0x8000, &delta).unwrap(), dst);
    }

    #[test]
    fn source_out_of_range_is_rejected() {
        let src = vec![0u8; 0x2000];
        assert_eq!(
            encode(&src, 0xf000, b"dst"),
            Err(EncodeError::SourceOutOfRange {
                addr: 0xf000,
                len: 0x2000
            })
        );
    }

    #[test]
    fn destination_out_of_range_is_rejected() {
        let dst = vec![0u8; 0x2000];
        let opts = EncodeOptions {
            dst_addr: Some(0xf000),
            ..Default::default()
        };
        assert_eq!(
            encode_with_options(b"src", 0, &dst, &opts),
            Err(EncodeError::DestinationOutOfRange {
                addr: 0xf000,
                len: 0x2000
            })
        );
    }
}
