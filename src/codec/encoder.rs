// Delta encoder: fragment walk, diff classification, and serialization.
//
// The walk emits INS/SKP to bridge the unaligned gap before each fragment,
// then classifies every byte of the aligned region (plus a tail reaching
// toward the next fragment) as matching, differing, or half of a
// relocatable pointer, and run-length codes the result as CPY/RPL/MOV.
// A one-instruction lookahead fuses a pending CPY with a following
// single-byte RPL or single-pointer MOV into CPR/CPM.

use log::debug;

use super::header::DeltaHeader;
use super::opcode::{Op, emit_op};
use crate::bytes::{addr16, fletcher16, pack16};
use crate::reloc::{IndexMapping, RelocationTable};

/// Largest CPY count the fused CPR/CPM headers can carry.
const FUSE_MAX: usize = 0x0f + 255;

// ---------------------------------------------------------------------------
// Instruction writer
// ---------------------------------------------------------------------------

/// Serializes instructions, deferring each CPY by one instruction so it
/// can fuse with a single-byte RPL (into CPR) or a single-pointer MOV
/// (into CPM).
#[derive(Debug, Default)]
pub struct InstructionWriter {
    buf: Vec<u8>,
    pending_copy: usize,
}

impl InstructionWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `n` source bytes to the destination.
    pub fn copy(&mut self, n: usize) {
        debug_assert!(n > 0);
        self.flush();
        self.pending_copy = n;
    }

    /// Insert literal bytes.
    pub fn insert(&mut self, data: &[u8]) {
        self.flush();
        emit_op(&mut self.buf, Op::Ins, data.len(), data);
    }

    /// Move the source cursor by `delta` bytes, encoded modular 16-bit.
    pub fn skip(&mut self, delta: isize) {
        self.flush();
        let n = delta.rem_euclid(1 << 16) as usize;
        emit_op(&mut self.buf, Op::Skp, n, &[]);
    }

    /// Replace source bytes with literal data.
    pub fn replace(&mut self, data: &[u8]) {
        if self.pending_copy > 0 && data.len() == 1 && self.pending_copy <= FUSE_MAX {
            let n = std::mem::take(&mut self.pending_copy);
            emit_op(&mut self.buf, Op::Cpr, n, data);
        } else {
            self.flush();
            emit_op(&mut self.buf, Op::Rpl, data.len(), data);
        }
    }

    /// Relocate `n` consecutive u16 pointers.
    pub fn relocate(&mut self, n: usize) {
        if self.pending_copy > 0 && n == 1 && self.pending_copy <= FUSE_MAX {
            let copied = std::mem::take(&mut self.pending_copy);
            emit_op(&mut self.buf, Op::Cpm, copied, &[]);
        } else {
            self.flush();
            emit_op(&mut self.buf, Op::Mov, n, &[]);
        }
    }

    /// Flush the pending copy, terminate the stream, and return the body.
    pub fn finish(mut self) -> Vec<u8> {
        self.flush();
        emit_op(&mut self.buf, Op::End, 0, &[]);
        self.buf
    }

    fn flush(&mut self) {
        if self.pending_copy > 0 {
            let n = std::mem::take(&mut self.pending_copy);
            emit_op(&mut self.buf, Op::Cpy, n, &[]);
        }
    }
}

// ---------------------------------------------------------------------------
// Diff classification
// ---------------------------------------------------------------------------

const SAME: u8 = 0;
const DIFF: u8 = 1;
const RELOC: u8 = 2;

/// Classify each byte of the aligned region: matching, differing, or half
/// of a relocatable u16 pointer. The tail past `fragment_len` is kept only
/// while every mismatch belongs to a relocatable pointer; the map is
/// truncated at the first one that does not.
fn classify(
    dst_frag: &[u8],
    src_frag: &[u8],
    fragment_len: usize,
    reloc: &RelocationTable,
) -> Vec<u8> {
    let mut diff: Vec<u8> = dst_frag
        .iter()
        .zip(src_frag)
        .map(|(x, y)| if x == y { SAME } else { DIFF })
        .collect();

    let relocated = |j: usize| -> bool {
        reloc.relocate(addr16(&src_frag[j..])) == Some(addr16(&dst_frag[j..]))
    };

    let mut i = 0;
    while i < diff.len() {
        if diff[i] == DIFF {
            if i > 0 && diff[i - 1] == DIFF && relocated(i - 1) {
                diff[i - 1] = RELOC;
                diff[i] = RELOC;
            } else if i + 1 < diff.len() && relocated(i) {
                diff[i] = RELOC;
                diff[i + 1] = RELOC;
            } else if i >= fragment_len {
                diff.truncate(i);
                break;
            }
        }
        i += 1;
    }
    diff
}

// ---------------------------------------------------------------------------
// Fragment walk
// ---------------------------------------------------------------------------

/// Serialize a complete delta stream from discovered fragments.
///
/// `fragments` must be non-overlapping and increasing in destination
/// order, as produced by the fragment search.
pub fn encode_delta(
    src: &[u8],
    src_addr: u16,
    dst: &[u8],
    dst_addr: u16,
    mut fragments: Vec<IndexMapping>,
) -> Vec<u8> {
    let reloc = RelocationTable::new(
        &fragments,
        src_addr,
        dst_addr as isize - src_addr as isize,
    );

    let mut delta = Vec::new();
    DeltaHeader {
        src_addr,
        src_len: src.len() as u16,
        src_checksum: fletcher16(src),
        dst_addr,
    }
    .encode(&mut delta);

    // An empty fragment pinned at the end of the destination marks the end
    // of the walk.
    fragments.push(IndexMapping::new(0, dst.len() as isize, 0));

    let mut w = InstructionWriter::new();
    let mut i_src = 0usize;
    let mut i_dst = 0usize;

    for k in 0..fragments.len() {
        let fragment = fragments[k];

        // Bridge the unaligned section before this fragment.
        debug_assert!(
            fragment.map_start() >= i_dst,
            "fragments must be monotonic in the destination"
        );
        let n_dst = fragment.map_start() - i_dst;
        let n_src = if fragment.is_empty() {
            0
        } else {
            fragment.start as isize - i_src as isize
        };

        if n_dst > 0 {
            w.insert(&dst[i_dst..i_dst + n_dst]);
            i_dst += n_dst;
        }
        if n_src != 0 {
            w.skip(n_src);
            i_src = fragment.start;
        }
        if fragment.is_empty() {
            break;
        }

        // Analyze the aligned section plus the tail reaching toward the
        // next fragment (the end marker guarantees one exists).
        let tail = (fragments[k + 1].map_start() - fragment.map_end())
            .min(src.len() - fragment.end());
        let n = fragment.length + tail;
        let dst_frag = &dst[fragment.map_start()..fragment.map_start() + n];
        let src_frag = &src[fragment.start..fragment.start + n];

        let diff = classify(dst_frag, src_frag, fragment.length, &reloc);
        if diff.len() != fragment.length {
            debug!(
                "extended fragment at {:#06x} from {} to {} bytes",
                fragment.map_start(),
                fragment.length,
                diff.len()
            );
        }

        // Run-length code the classification.
        let mut pos = 0usize;
        while pos < diff.len() {
            let class = diff[pos];
            let mut end = pos + 1;
            while end < diff.len() && diff[end] == class {
                end += 1;
            }
            let run = end - pos;
            match class {
                SAME => w.copy(run),
                DIFF => w.replace(&dst[i_dst..i_dst + run]),
                _ => {
                    debug_assert!(run % 2 == 0, "pointer runs cover whole u16 pairs");
                    w.relocate(run / 2);
                }
            }
            i_src += run;
            i_dst += run;
            pos = end;
        }
    }
    debug_assert_eq!(i_dst, dst.len(), "walk must consume the destination");

    delta.extend_from_slice(&w.finish());
    delta.extend_from_slice(&pack16(fletcher16(dst)));
    delta
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
