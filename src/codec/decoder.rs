// Delta decoder: two passes over a cached instruction list.
//
// The delta does not transmit the relocation table. Pass 1 walks the
// instructions with both cursors and infers the table: a run of aligned
// ops (CPY/CPR/CPM/RPL/MOV) between INS/SKP/END boundaries marks a source
// interval that reappears at the current cursor offset. Pass 2 walks the
// same instructions again and materializes the destination, relocating
// MOV/CPM pointers through the inferred table.
//
// Instructions are parsed once up front; both passes share the list.

use log::{debug, trace};
use thiserror::Error;

use super::header::{DeltaHeader, HEADER_LEN};
use super::opcode::{self, Instruction, Op};
use crate::bytes::{addr16, fletcher16, hexstring, pack16};
use crate::reloc::{IndexMapping, RelocationTable};

// ---------------------------------------------------------------------------
// Decoder error
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("bad magic: expected 0x0D16, got {found:#06x}")]
    BadMagic { found: u16 },

    #[error("truncated delta ({what})")]
    Truncated { what: &'static str },

    #[error("unknown opcode {byte:#04x}")]
    UnknownOpcode { byte: u8 },

    #[error("source length mismatch: delta applies to {expected} bytes, got {actual}")]
    SourceLenMismatch { expected: usize, actual: usize },

    #[error("source address mismatch: delta applies to base {expected:#06x}, got {actual:#06x}")]
    SourceAddrMismatch { expected: u16, actual: u16 },

    #[error("source checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    SourceChecksum { expected: u16, actual: u16 },

    #[error("destination checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    DestinationChecksum { expected: u16, actual: u16 },

    #[error("pointer {addr:#06x} is not covered by any relocation entry")]
    UnmappedPointer { addr: u16 },

    #[error("instruction overruns the source at {pos}+{len}")]
    SourceOverrun { pos: usize, len: usize },

    #[error("trailing data after end of stream ({remaining} bytes)")]
    TrailingData { remaining: usize },
}

// ---------------------------------------------------------------------------
// Instruction parsing
// ---------------------------------------------------------------------------

/// Parse a complete instruction body (everything between the header and
/// the checksum trailer) into a list of instructions.
///
/// The body must end with a single END opcode and nothing after it.
/// Public so callers can inspect a delta's stream without applying it.
pub fn parse_instructions(body: &[u8]) -> Result<Vec<Instruction<'_>>, DecodeError> {
    let mut out = Vec::new();
    let mut pos = 0usize;

    loop {
        let v = *body.get(pos).ok_or(DecodeError::Truncated {
            what: "instruction stream",
        })?;
        pos += 1;

        let spec = opcode::lookup(v).ok_or(DecodeError::UnknownOpcode { byte: v })?;
        if spec.op == Op::End {
            if pos != body.len() {
                return Err(DecodeError::TrailingData {
                    remaining: body.len() - pos,
                });
            }
            return Ok(out);
        }

        let limit = spec.mask as usize;
        let mut n = (v & spec.mask) as usize;
        if n == 0 {
            let raw = body
                .get(pos..pos + 2)
                .ok_or(DecodeError::Truncated { what: "count" })?;
            n = addr16(raw) as usize;
            pos += 2;
        } else if n == limit {
            let ext = *body
                .get(pos)
                .ok_or(DecodeError::Truncated { what: "count" })?;
            n += ext as usize;
            pos += 1;
        }

        let data_len = opcode::payload_len(spec.op, n);
        let data = body
            .get(pos..pos + data_len)
            .ok_or(DecodeError::Truncated { what: "payload" })?;
        pos += data_len;

        out.push(match spec.op {
            Op::Cpy => Instruction::Copy { n },
            Op::Ins => Instruction::Insert { data },
            Op::Skp => Instruction::Skip { n: n as u16 },
            Op::Rpl => Instruction::Replace { data },
            Op::Mov => Instruction::Relocate { n },
            Op::Cpr => Instruction::CopyReplace { n, byte: data[0] },
            Op::Cpm => Instruction::CopyRelocate { n },
            Op::End => unreachable!("END returns above"),
        });
    }
}

// ---------------------------------------------------------------------------
// Pass 1: relocation inference
// ---------------------------------------------------------------------------

/// Walk the instructions with both cursors and collect the source
/// intervals delimited by runs of aligned ops. No output is produced and
/// no pointer is relocated; only the cursors advance.
fn infer_relocations(instructions: &[Instruction<'_>]) -> Vec<IndexMapping> {
    let mut entries = Vec::new();
    let mut entry: Option<IndexMapping> = None;
    let mut i_src = 0usize;
    let mut i_dst = 0usize;

    for inst in instructions {
        if inst.is_aligned() {
            if entry.is_none() {
                entry = Some(IndexMapping::new(
                    i_src,
                    i_dst as isize - i_src as isize,
                    0,
                ));
            }
        } else if let Some(mut open) = entry.take() {
            open.length = i_src - open.start;
            entries.push(open);
        }

        if let Instruction::Skip { n } = inst {
            i_src = (i_src + *n as usize) & 0xffff;
        } else {
            i_src += inst.src_advance();
            i_dst += inst.dst_advance();
        }
    }

    // END closes any open run.
    if let Some(mut open) = entry.take() {
        open.length = i_src - open.start;
        entries.push(open);
    }

    entries
}

// ---------------------------------------------------------------------------
// Pass 2: output
// ---------------------------------------------------------------------------

fn src_slice<'a>(src: &'a [u8], pos: usize, len: usize) -> Result<&'a [u8], DecodeError> {
    src.get(pos..pos + len)
        .ok_or(DecodeError::SourceOverrun { pos, len })
}

fn relocate_pointer(
    src: &[u8],
    pos: usize,
    reloc: &RelocationTable,
) -> Result<[u8; 2], DecodeError> {
    let addr = addr16(src_slice(src, pos, 2)?);
    let mapped = reloc
        .relocate(addr)
        .ok_or(DecodeError::UnmappedPointer { addr })?;
    Ok(pack16(mapped))
}

/// Materialize the destination from the instruction list.
fn materialize(
    src: &[u8],
    instructions: &[Instruction<'_>],
    reloc: &RelocationTable,
) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    let mut i_src = 0usize;

    for inst in instructions {
        trace!(
            "{inst:?}  dst {:#06x}  src {:#06x}: {} ...",
            out.len(),
            i_src,
            hexstring(src.get(i_src..src.len().min(i_src + 4)).unwrap_or_default())
        );
        match *inst {
            Instruction::Copy { n } => {
                out.extend_from_slice(src_slice(src, i_src, n)?);
                i_src += n;
            }
            Instruction::Insert { data } => {
                out.extend_from_slice(data);
            }
            Instruction::Skip { n } => {
                i_src = (i_src + n as usize) & 0xffff;
            }
            Instruction::Replace { data } => {
                out.extend_from_slice(data);
                i_src += data.len();
            }
            Instruction::Relocate { n } => {
                for k in 0..n {
                    let pointer = relocate_pointer(src, i_src + 2 * k, reloc)?;
                    out.extend_from_slice(&pointer);
                }
                i_src += 2 * n;
            }
            Instruction::CopyReplace { n, byte } => {
                out.extend_from_slice(src_slice(src, i_src, n)?);
                out.push(byte);
                i_src += n + 1;
            }
            Instruction::CopyRelocate { n } => {
                out.extend_from_slice(src_slice(src, i_src, n)?);
                let pointer = relocate_pointer(src, i_src + n, reloc)?;
                out.extend_from_slice(&pointer);
                i_src += n + 2;
            }
        }
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// Top-level decode
// ---------------------------------------------------------------------------

/// Apply `delta` to `src`, reconstructing the destination.
///
/// Verifies the header binding (magic, source address, length, checksum)
/// before the first pass and the destination checksum after the second.
pub fn decode_delta(src: &[u8], src_addr: u16, delta: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let header = DeltaHeader::decode(delta)?;

    if header.src_len as usize != src.len() {
        return Err(DecodeError::SourceLenMismatch {
            expected: header.src_len as usize,
            actual: src.len(),
        });
    }
    if header.src_addr != src_addr {
        return Err(DecodeError::SourceAddrMismatch {
            expected: header.src_addr,
            actual: src_addr,
        });
    }
    let src_sum = fletcher16(src);
    if header.src_checksum != src_sum {
        return Err(DecodeError::SourceChecksum {
            expected: header.src_checksum,
            actual: src_sum,
        });
    }

    let body = &delta[HEADER_LEN..delta.len() - 2];
    let instructions = parse_instructions(body)?;

    let entries = infer_relocations(&instructions);
    let reloc = RelocationTable::new(
        &entries,
        src_addr,
        header.dst_addr as isize - src_addr as isize,
    );
    debug!(
        "inferred {} relocation entr{}:\n{}",
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" },
        reloc
    );

    let dst = materialize(src, &instructions, &reloc)?;

    let expected = addr16(&delta[delta.len() - 2..]);
    let actual = fletcher16(&dst);
    if expected != actual {
        return Err(DecodeError::DestinationChecksum { expected, actual });
    }
    Ok(dst)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
