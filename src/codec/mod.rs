// Delta16 stream format.
//
// This module owns everything that touches delta bytes:
//
// - `opcode`  — instruction set, header-byte layout, count encoding
// - `header`  — fixed framing header and checksum trailer
// - `encoder` — fragment walk, diff classification, peephole fusion
// - `decoder` — two-pass decoding (relocation inference, then output)

pub mod decoder;
pub mod encoder;
pub mod header;
pub mod opcode;

// Re-export key types for convenience.
pub use decoder::{DecodeError, decode_delta, parse_instructions};
pub use encoder::{InstructionWriter, encode_delta};
pub use header::{DELTA_MAGIC, DeltaHeader, HEADER_LEN, MIN_DELTA_LEN};
pub use opcode::{Instruction, OP_TABLE, Op, OpSpec};
