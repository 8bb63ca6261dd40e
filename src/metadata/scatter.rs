//! Scatter stage: one tile record per tile, one work unit per group.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::types::{tiles_for, TileRecord, ENCODING_LIMIT};
use crate::ScheduleError;

/// Reject group counts whose ids would not fit the 16-bit group field.
///
/// Only needs `G`, so the pipeline runs it while planning, before allocation.
pub(crate) fn check_group_count(num_groups: usize) -> Result<(), ScheduleError> {
    if num_groups > ENCODING_LIMIT {
        return Err(ScheduleError::EncodingOverflow {
            group: ENCODING_LIMIT,
            local_tile: 0,
        });
    }
    Ok(())
}

/// Reject histograms whose records would not survive the 16-bit packing.
///
/// Runs before any record is written so a failing schedule never contains a
/// partial table.
pub(crate) fn check_encoding_budget(histogram: &[u32], tile_dim: u32) -> Result<(), ScheduleError> {
    check_group_count(histogram.len())?;
    for (group, &count) in histogram.iter().enumerate() {
        let tiles = tiles_for(count, tile_dim) as usize;
        if tiles > ENCODING_LIMIT {
            return Err(ScheduleError::EncodingOverflow {
                group,
                local_tile: ENCODING_LIMIT,
            });
        }
        // (0xFFFF, 0xFFFF) packs to the sentinel.
        if group == ENCODING_LIMIT - 1 && tiles == ENCODING_LIMIT {
            return Err(ScheduleError::EncodingOverflow {
                group,
                local_tile: ENCODING_LIMIT - 1,
            });
        }
    }
    Ok(())
}

/// Write `(t << 16) | g` into `tile_info[tile_starts[g] + t]` for every tile.
///
/// `tile_starts` must be the finished scan output. Fails with
/// [`ScheduleError::CapacityExceeded`] when `tile_starts[G]` does not fit
/// `tile_info`, before anything is written. Each group gets its own
/// `&mut` window carved from `tile_info` at `tile_starts[g]`, so the work units
/// run in parallel with no shared mutable state. Slots past `tile_starts[G]`
/// are not touched.
pub(crate) fn scatter_tiles(
    histogram: &[u32],
    tile_dim: u32,
    tile_starts: &[u32],
    tile_info: &mut [u32],
) -> Result<(), ScheduleError> {
    let g = histogram.len();
    assert_eq!(tile_starts.len(), g + 1, "tile_starts region length mismatch");

    check_encoding_budget(histogram, tile_dim)?;

    let required = tile_starts[g] as usize;
    if required > tile_info.len() {
        return Err(ScheduleError::CapacityExceeded {
            required,
            capacity: tile_info.len(),
        });
    }

    let mut units: Vec<(u32, &mut [u32])> = Vec::with_capacity(g);
    let mut rest = tile_info;
    let mut cursor = 0usize;
    for (group, &count) in histogram.iter().enumerate() {
        let base = tile_starts[group] as usize;
        let tiles = tiles_for(count, tile_dim) as usize;
        assert_eq!(base, cursor, "tile_starts is not the prefix sum of tile counts");
        if tiles == 0 {
            continue;
        }
        let (window, tail) = std::mem::take(&mut rest).split_at_mut(tiles);
        units.push((group as u32, window));
        rest = tail;
        cursor += tiles;
    }
    debug_assert_eq!(cursor, required);

    tracing::debug!(
        groups = g,
        active_groups = units.len(),
        tiles = required,
        slack = rest.len(),
        "scattering tile records"
    );

    maybe_par_into_iter!(units).for_each(|(group, window)| write_group(group, window));
    Ok(())
}

#[inline]
fn write_group(group: u32, window: &mut [u32]) {
    for (local, slot) in window.iter_mut().enumerate() {
        *slot = TileRecord::pack(local as u32, group).raw();
    }
}
