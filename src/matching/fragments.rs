// Block-scored fragment search.
//
// Each destination chunk of `block_size` bytes is scored against every
// aligned source offset by counting equal bytes; the best offset (lowest
// index on ties) seeds a greedy `find_overlap` extension, allowing the
// match to reach back over ground already covered by the previous
// fragment. Matches shorter than `block_size` are rejected.
//
// This misses partial matches hanging off either end of the source; the
// chunk scoring only locates an aligned block, the overlap extension does
// the rest.

use log::debug;

use super::overlap::find_overlap;
use crate::reloc::IndexMapping;

/// Default chunk granularity; also the minimum accepted fragment length.
pub const DEFAULT_BLOCK_SIZE: usize = 64;

/// Find fragments of `src` that reappear in `dst`, in increasing and
/// non-overlapping destination order.
///
/// A chunk must share at least `max(2, block_size/2)` bytes with some
/// aligned source offset before the overlap extension is attempted, and
/// the extended overlap must reach `block_size` bytes to be kept.
pub fn find_fragments(dst: &[u8], src: &[u8], block_size: usize) -> Vec<IndexMapping> {
    if dst.is_empty() || src.is_empty() {
        return Vec::new();
    }

    // A zero block size cannot advance the scan.
    let block_size = block_size.max(1);

    let min_size = block_size;
    let min_overlap = 2.max(block_size / 2);
    let block_size = block_size.min(src.len());

    let shifts = src.len() - block_size + 1;
    let mut matches: Vec<IndexMapping> = Vec::new();
    let mut i_dst = 0usize;

    while i_dst < dst.len() {
        let chunk = &dst[i_dst..dst.len().min(i_dst + block_size)];

        // Score every aligned source offset by counting equal bytes; ties
        // resolve to the lowest offset.
        let mut i_src = 0usize;
        let mut best = 0usize;
        for s in 0..shifts {
            let score = chunk.iter().zip(&src[s..]).filter(|(x, y)| x == y).count();
            if score > best {
                best = score;
                i_src = s;
            }
        }

        if best >= min_overlap {
            // Let the match extend backward past the end of the previous
            // one, but not before the start of either buffer.
            let lookback = match matches.last() {
                None => 0,
                Some(last) => (i_dst - last.map_end()).min(i_dst).min(i_src),
            };
            if let Some((start, n)) = find_overlap(
                &dst[i_dst - lookback..],
                &src[i_src - lookback..],
                min_size / 4,
                lookback,
            ) {
                if n >= min_size {
                    let m = IndexMapping::new(
                        i_src - lookback + start,
                        i_dst as isize - i_src as isize,
                        n,
                    );
                    debug_assert!(
                        matches.last().is_none_or(|last| m.map_start() >= last.map_end()),
                        "fragments must not overlap in the destination"
                    );
                    i_dst = m.map_end();
                    matches.push(m);
                    continue;
                }
            }
        }
        i_dst += block_size;
    }

    debug!("fragment search found {} match(es)", matches.len());
    matches
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
