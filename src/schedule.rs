//! Schedule storage and zero-copy region access.

use crate::layout::MetadataLayout;
use crate::metadata::MetadataBuffer;
use crate::types::TileRecord;

/// A computed dispatch schedule.
///
/// Owns the single metadata allocation and hands out views into it:
/// - `hist`: per-group item counts, copied from the input histogram
/// - `tok_starts`: exclusive prefix sum of `hist` (length G + 1)
/// - `tile_starts`: exclusive prefix sum of per-group tile counts (length G + 1)
/// - `tile_info`: one packed [`TileRecord`] per dispatched tile, sentinel-padded
///   to the planned capacity
///
/// An *unrouted* schedule (no histogram was supplied) has no buffer at all and
/// every accessor returns `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schedule {
    routed: Option<Routed>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Routed {
    layout: MetadataLayout,
    buffer: Vec<u32>,
    total_tokens: u32,
}

impl Schedule {
    /// The schedule for "no routing performed".
    #[inline]
    pub fn unrouted() -> Self {
        Self { routed: None }
    }

    /// Wrap a fully populated metadata buffer.
    pub(crate) fn assemble(metadata: MetadataBuffer) -> Self {
        let (layout, buffer) = metadata.into_parts();
        let total_tokens = buffer[layout.tok_starts().end - 1];
        Self {
            routed: Some(Routed {
                layout,
                buffer,
                total_tokens,
            }),
        }
    }

    #[inline]
    pub fn is_unrouted(&self) -> bool {
        self.routed.is_none()
    }

    #[inline]
    pub fn layout(&self) -> Option<&MetadataLayout> {
        self.routed.as_ref().map(|r| &r.layout)
    }

    /// Number of groups (0 when unrouted).
    #[inline]
    pub fn num_groups(&self) -> usize {
        self.layout().map_or(0, MetadataLayout::num_groups)
    }

    #[inline]
    pub fn tile_dim(&self) -> Option<u32> {
        self.layout().map(MetadataLayout::tile_dim)
    }

    /// Declared tile-info capacity.
    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        self.layout().map(MetadataLayout::capacity)
    }

    /// Sum of the histogram, `tok_starts[G]`.
    #[inline]
    pub fn total_tokens(&self) -> Option<u32> {
        self.routed.as_ref().map(|r| r.total_tokens)
    }

    /// Number of live tile records, `tile_starts[G]`.
    #[inline]
    pub fn total_tiles(&self) -> Option<usize> {
        self.tile_starts()
            .and_then(|s| s.last())
            .map(|&n| n as usize)
    }

    /// The whole metadata buffer.
    #[inline]
    pub fn raw(&self) -> Option<&[u32]> {
        self.routed.as_ref().map(|r| r.buffer.as_slice())
    }

    #[inline]
    pub fn hist(&self) -> Option<&[u32]> {
        self.routed.as_ref().map(|r| &r.buffer[r.layout.hist()])
    }

    #[inline]
    pub fn tok_starts(&self) -> Option<&[u32]> {
        self.routed.as_ref().map(|r| &r.buffer[r.layout.tok_starts()])
    }

    #[inline]
    pub fn tile_starts(&self) -> Option<&[u32]> {
        self.routed.as_ref().map(|r| &r.buffer[r.layout.tile_starts()])
    }

    /// Raw packed tile records, including trailing sentinel slack.
    #[inline]
    pub fn tile_info(&self) -> Option<&[u32]> {
        self.routed.as_ref().map(|r| &r.buffer[r.layout.tile_info()])
    }

    /// `tile_info` viewed as typed records.
    #[inline]
    pub fn tile_records(&self) -> Option<&[TileRecord]> {
        self.tile_info().map(bytemuck::cast_slice::<u32, TileRecord>)
    }

    /// Records of one group, in local tile order.
    pub fn group_tiles(&self, group: usize) -> Option<&[TileRecord]> {
        let starts = self.tile_starts()?;
        let end = *starts.get(group.checked_add(1)?)? as usize;
        let start = starts[group] as usize;
        self.tile_records().map(|records| &records[start..end])
    }

    /// Live `(slot, record)` pairs in dispatch order; sentinel slots are skipped.
    pub fn tiles(&self) -> impl Iterator<Item = (usize, TileRecord)> + '_ {
        self.tile_records()
            .unwrap_or(&[])
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_sentinel())
            .map(|(slot, &r)| (slot, r))
    }

    /// Give up the buffer, e.g. to upload it as-is.
    pub fn into_raw(self) -> Option<(MetadataLayout, Vec<u32>)> {
        self.routed.map(|r| (r.layout, r.buffer))
    }
}
