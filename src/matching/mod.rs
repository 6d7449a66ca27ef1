// Fragment discovery between destination and source images.
//
// This module finds the large aligned regions the encoder copies by
// reference; the codec module turns them into an instruction stream.
//
// - `overlap`   — greedy lockstep extension tolerating short mismatch runs
// - `fragments` — block-scored search for large repeated regions

pub mod fragments;
pub mod overlap;

pub use fragments::{DEFAULT_BLOCK_SIZE, find_fragments};
pub use overlap::find_overlap;
