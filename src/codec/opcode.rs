// Delta16 instruction set and opcode byte layout.
//
// A single header byte selects the operation and a short count; longer
// counts spill into one or two extra bytes. The header is a prefix plus a
// count bit field:
//
//   END  0000_0000    CPM  0000_nnnn    CPR  0001_nnnn    RPL  0010_nnnn
//   MOV  0011_nnnn    CPY  01nn_nnnn    INS  10nn_nnnn    SKP  11nn_nnnn
//
// The table below is scanned in order when decoding, so END claims the
// all-zero byte before CPM can.

use crate::bytes::pack16;

/// Operations of the delta instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Stream terminator.
    End,
    /// Copy + relocate one trailing pointer.
    Cpm,
    /// Copy + replace one trailing byte.
    Cpr,
    /// Replace source bytes with literal data.
    Rpl,
    /// Relocate consecutive u16 pointers.
    Mov,
    /// Copy source bytes.
    Cpy,
    /// Insert literal data.
    Ins,
    /// Move the source cursor (modular 16-bit).
    Skp,
}

/// Wire layout of one operation: header prefix, count bit mask, and
/// whether the instruction carries trailing payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpSpec {
    pub op: Op,
    pub prefix: u8,
    pub mask: u8,
    pub has_data: bool,
}

/// The opcode table, in decode scan order.
#[rustfmt::skip]
pub static OP_TABLE: [OpSpec; 8] = [
    OpSpec { op: Op::End, prefix: 0b0000_0000, mask: 0b0000_0000, has_data: false },
    OpSpec { op: Op::Cpm, prefix: 0b0000_0000, mask: 0b0000_1111, has_data: false },
    OpSpec { op: Op::Cpr, prefix: 0b0001_0000, mask: 0b0000_1111, has_data: true },
    OpSpec { op: Op::Rpl, prefix: 0b0010_0000, mask: 0b0000_1111, has_data: true },
    OpSpec { op: Op::Mov, prefix: 0b0011_0000, mask: 0b0000_1111, has_data: false },
    OpSpec { op: Op::Cpy, prefix: 0b0100_0000, mask: 0b0011_1111, has_data: false },
    OpSpec { op: Op::Ins, prefix: 0b1000_0000, mask: 0b0011_1111, has_data: true },
    OpSpec { op: Op::Skp, prefix: 0b1100_0000, mask: 0b0011_1111, has_data: false },
];

impl Op {
    /// Wire layout for this operation.
    pub fn spec(self) -> &'static OpSpec {
        // Discriminant order matches the table order.
        &OP_TABLE[self as usize]
    }
}

/// Find the operation whose prefix matches header byte `v`.
pub fn lookup(v: u8) -> Option<&'static OpSpec> {
    OP_TABLE.iter().find(|s| (v & !s.mask) == s.prefix)
}

/// Number of trailing payload bytes for `op` with count `n`.
pub fn payload_len(op: Op, n: usize) -> usize {
    match op {
        Op::Ins | Op::Rpl => n,
        Op::Cpr => 1,
        _ => 0,
    }
}

/// Append one instruction (header, count, payload) to `out`.
///
/// Counts below the field limit pack into the header byte; counts up to
/// `limit + 255` use one extension byte; anything larger uses a u16-le
/// count after a zero count field. The u16 form of the 4-bit ops would
/// collide with END, so those emit a maximum-size chunk and recurse on the
/// remainder. CPR never reaches the chunked form; the encoder caps its
/// count at `limit + 255`.
pub fn emit_op(out: &mut Vec<u8>, op: Op, n: usize, data: &[u8]) {
    let spec = op.spec();
    if op == Op::End {
        debug_assert_eq!(n, 0);
        out.push(spec.prefix);
        return;
    }
    debug_assert!(n > 0 && n <= 0xffff);
    debug_assert_eq!(data.len(), payload_len(op, n));

    let limit = spec.mask as usize;
    if n > limit + 255 {
        if spec.mask == 0b0000_1111 {
            debug_assert!(op != Op::Cpr);
            let k = limit + 255;
            out.push(spec.prefix | limit as u8);
            out.push(255);
            if spec.has_data {
                out.extend_from_slice(&data[..k]);
                emit_op(out, op, n - k, &data[k..]);
            } else {
                emit_op(out, op, n - k, &[]);
            }
        } else {
            out.push(spec.prefix);
            out.extend_from_slice(&pack16(n as u16));
            out.extend_from_slice(data);
        }
    } else if n >= limit {
        out.push(spec.prefix | limit as u8);
        out.push((n - limit) as u8);
        out.extend_from_slice(data);
    } else {
        out.push(spec.prefix | n as u8);
        out.extend_from_slice(data);
    }
}

// ---------------------------------------------------------------------------
// Decoded instruction
// ---------------------------------------------------------------------------

/// A decoded instruction with its payload borrowed from the delta buffer.
///
/// `END` terminates parsing and has no decoded form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// Copy `n` bytes from the source to the destination.
    Copy { n: usize },
    /// Emit literal bytes; only the destination cursor advances.
    Insert { data: &'a [u8] },
    /// Move the source cursor by `n` modulo 2^16; emits nothing.
    Skip { n: u16 },
    /// Emit literal bytes while the source cursor skips the same span.
    Replace { data: &'a [u8] },
    /// Relocate `n` consecutive u16 pointers read from the source.
    Relocate { n: usize },
    /// `Copy { n }` fused with a one-byte `Replace`.
    CopyReplace { n: usize, byte: u8 },
    /// `Copy { n }` fused with a one-pointer `Relocate`.
    CopyRelocate { n: usize },
}

impl Instruction<'_> {
    /// Bytes consumed from the source cursor. `Skip` reports zero; its
    /// cursor move is modular and handled by the caller.
    pub fn src_advance(&self) -> usize {
        match *self {
            Instruction::Copy { n } => n,
            Instruction::Insert { .. } | Instruction::Skip { .. } => 0,
            Instruction::Replace { data } => data.len(),
            Instruction::Relocate { n } => 2 * n,
            Instruction::CopyReplace { n, .. } => n + 1,
            Instruction::CopyRelocate { n } => n + 2,
        }
    }

    /// Bytes appended to the destination.
    pub fn dst_advance(&self) -> usize {
        match *self {
            Instruction::Copy { n } => n,
            Instruction::Insert { data } => data.len(),
            Instruction::Skip { .. } => 0,
            Instruction::Replace { data } => data.len(),
            Instruction::Relocate { n } => 2 * n,
            Instruction::CopyReplace { n, .. } => n + 1,
            Instruction::CopyRelocate { n } => n + 2,
        }
    }

    /// Whether this op keeps the source and destination cursors in
    /// lockstep. Runs of aligned ops delimit relocation table entries.
    pub fn is_aligned(&self) -> bool {
        !matches!(
            self,
            Instruction::Insert { .. } | Instruction::Skip { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
