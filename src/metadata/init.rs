//! Sentinel fill of the whole metadata buffer.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::types::SENTINEL;

/// Set every element of `buffer` to the sentinel, `block` elements per work item.
///
/// Must finish before the scan or scatter writes anything: tile-info slots the
/// scatter never reaches have to read back as the sentinel.
pub(crate) fn fill_sentinel(buffer: &mut [u32], block: usize) {
    debug_assert!(block > 0, "memset block must be positive");
    maybe_par_chunks_mut!(buffer, block).for_each(|chunk| chunk.fill(SENTINEL));
}
