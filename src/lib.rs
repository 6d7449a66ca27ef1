//! Delta16: relocation-aware binary deltas for 16-bit address-space images.
//!
//! The codec encodes the difference between two byte blobs of at most
//! 64 KiB (ROM images, firmware) into a compact delta stream. Fragments of
//! the source that reappear at a different base address in the destination
//! are copied by reference, and 16-bit pointers embedded in those fragments
//! are relocated instead of stored literally. The delta does not carry the
//! relocation table; the decoder reconstructs it from the instruction
//! stream in a first pass before emitting any output.
//!
//! # Quick Start
//!
//! ```
//! let source = b"the quick brown fox jumps over the lazy dog";
//! let target = b"jumps over the lazy dog does the quick brown fox";
//!
//! let opts = delta16::EncodeOptions {
//!     block_size: 8,
//!     ..Default::default()
//! };
//! let delta = delta16::encode_with_options(source, 0, target, &opts).unwrap();
//! let decoded = delta16::decode(source, 0, &delta).unwrap();
//! assert_eq!(decoded, target);
//! ```

pub mod bytes;
pub mod codec;
pub mod engine;
pub mod matching;
pub mod reloc;

pub use codec::decoder::DecodeError;
pub use engine::{EncodeError, EncodeOptions, decode, encode, encode_with_options};
