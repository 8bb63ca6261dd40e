//! Metadata buffer construction: sentinel fill, prefix scan, tile scatter.
//!
//! All four regions live in one `Vec<u32>`. Stages borrow disjoint regions
//! through [`MetadataBuffer::regions_mut`], so no stage can observe another
//! stage's partial writes except through the ordering imposed by the caller.

/// Conditionally parallel iterator over a slice.
macro_rules! maybe_par_iter {
    ($slice:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $slice.par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.iter()
        }
    }};
}

/// Conditionally parallel owning iterator.
macro_rules! maybe_par_into_iter {
    ($v:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $v.into_par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $v.into_iter()
        }
    }};
}

/// Conditionally parallel chunk iterator.
macro_rules! maybe_par_chunks {
    ($slice:expr, $size:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $slice.par_chunks($size)
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.chunks($size)
        }
    }};
}

/// Conditionally parallel mutable chunk iterator.
macro_rules! maybe_par_chunks_mut {
    ($slice:expr, $size:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $slice.par_chunks_mut($size)
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.chunks_mut($size)
        }
    }};
}

mod init;
mod scan;
mod scatter;

pub(crate) use init::fill_sentinel;
pub(crate) use scan::{scan_blocked, scan_sequential};
pub(crate) use scatter::{check_group_count, scatter_tiles};

use crate::layout::MetadataLayout;

/// Mutable views of the four regions, borrowed together.
pub(crate) struct RegionsMut<'a> {
    pub(crate) hist: &'a mut [u32],
    pub(crate) tok_starts: &'a mut [u32],
    pub(crate) tile_starts: &'a mut [u32],
    pub(crate) tile_info: &'a mut [u32],
}

/// One contiguous metadata allocation plus its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MetadataBuffer {
    layout: MetadataLayout,
    data: Vec<u32>,
}

impl MetadataBuffer {
    /// Allocate a buffer sized for `layout`. Contents are the sentinel only
    /// after [`fill_sentinel`] has run; `vec!` zero-fills here.
    pub(crate) fn allocate(layout: MetadataLayout) -> Self {
        Self {
            layout,
            data: vec![0; layout.total_len()],
        }
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [u32] {
        &mut self.data
    }

    /// Split the buffer into its four regions.
    pub(crate) fn regions_mut(&mut self) -> RegionsMut<'_> {
        let g = self.layout.num_groups();
        let (hist, rest) = self.data.split_at_mut(g);
        let (tok_starts, rest) = rest.split_at_mut(g + 1);
        let (tile_starts, tile_info) = rest.split_at_mut(g + 1);
        debug_assert_eq!(tile_info.len(), self.layout.capacity());
        RegionsMut {
            hist,
            tok_starts,
            tile_starts,
            tile_info,
        }
    }

    pub(crate) fn into_parts(self) -> (MetadataLayout, Vec<u32>) {
        (self.layout, self.data)
    }
}
