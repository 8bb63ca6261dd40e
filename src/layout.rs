//! Metadata buffer layout: region extents and the tile-capacity bound.

use std::ops::Range;

use crate::ScheduleError;

/// Region extents of one metadata buffer.
///
/// The buffer holds `3 * G + 2 + capacity` elements laid out as
/// `hist | tok_starts | tile_starts | tile_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataLayout {
    num_groups: usize,
    tile_dim: u32,
    capacity: usize,
}

impl MetadataLayout {
    /// Plan a layout for `num_groups` groups and `capacity` tile-info slots.
    ///
    /// Fails before anything is allocated when `tile_dim` is zero or does not
    /// fit the `u32` element width, or when the total length overflows.
    pub fn plan(num_groups: usize, tile_dim: usize, capacity: usize) -> Result<Self, ScheduleError> {
        let tile_dim = checked_tile_dim(tile_dim)?;
        num_groups
            .checked_mul(3)
            .and_then(|n| n.checked_add(2))
            .and_then(|n| n.checked_add(capacity))
            .ok_or_else(|| {
                ScheduleError::invalid_config(format!(
                    "metadata length overflows usize (groups={num_groups}, capacity={capacity})"
                ))
            })?;
        Ok(Self {
            num_groups,
            tile_dim,
            capacity,
        })
    }

    #[inline]
    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    #[inline]
    pub fn tile_dim(&self) -> u32 {
        self.tile_dim
    }

    /// Declared tile-info capacity (`grid_m`).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of `u32` elements in the buffer.
    #[inline]
    pub fn total_len(&self) -> usize {
        3 * self.num_groups + 2 + self.capacity
    }

    #[inline]
    pub fn hist(&self) -> Range<usize> {
        0..self.num_groups
    }

    #[inline]
    pub fn tok_starts(&self) -> Range<usize> {
        self.num_groups..2 * self.num_groups + 1
    }

    #[inline]
    pub fn tile_starts(&self) -> Range<usize> {
        2 * self.num_groups + 1..3 * self.num_groups + 2
    }

    #[inline]
    pub fn tile_info(&self) -> Range<usize> {
        3 * self.num_groups + 2..self.total_len()
    }
}

fn checked_tile_dim(tile_dim: usize) -> Result<u32, ScheduleError> {
    if tile_dim == 0 {
        return Err(ScheduleError::invalid_config("tile_dim must be positive"));
    }
    u32::try_from(tile_dim).map_err(|_| {
        ScheduleError::invalid_config(format!("tile_dim {tile_dim} exceeds u32 range"))
    })
}

/// Upper bound on the number of tiles a dispatch over `total_work_items`
/// items spread across `num_groups` groups can need (`grid_m`).
///
/// With `total_work_items <= G` every item may land in its own group, one tile
/// each. Otherwise the bound is `(G - 1) - floor((G - total - 1) / tile_dim)`:
/// at most `G - 1` groups can each waste one partially filled tile.
pub fn tile_capacity(
    num_groups: usize,
    total_work_items: usize,
    tile_dim: usize,
) -> Result<usize, ScheduleError> {
    checked_tile_dim(tile_dim)?;
    if total_work_items <= num_groups {
        return Ok(total_work_items);
    }

    let as_i128 = |v: usize| v as i128;
    let g = as_i128(num_groups);
    let n = as_i128(total_work_items);
    let d = as_i128(tile_dim);
    // div_euclid is floor division for a positive divisor.
    let grid_m = (g - 1) - (g - n - 1).div_euclid(d);
    usize::try_from(grid_m).map_err(|_| {
        ScheduleError::invalid_config(format!(
            "tile capacity {grid_m} out of range (groups={num_groups}, items={total_work_items}, tile_dim={tile_dim})"
        ))
    })
}
