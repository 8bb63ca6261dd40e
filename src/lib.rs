//! Tile dispatch schedules for grouped, variable-size parallel work.
//!
//! Given a histogram of work items per group (e.g. tokens routed to each
//! expert), this crate builds the metadata a single uniform dispatch needs:
//! per-group token offsets, per-group tile offsets, and a table mapping every
//! fixed-size tile to `(local_tile_index, group)`.
//!
//! Everything lives in one `u32` buffer laid out as
//! `hist | tok_starts | tile_starts | tile_info`, built in three stages:
//! sentinel fill, prefix scan, per-group scatter.
//!
//! # Example
//!
//! ```
//! use tile_schedule::compute_schedule;
//!
//! let schedule = compute_schedule(Some(&[3, 0, 5]), 8, 4).expect("valid sizing");
//!
//! assert_eq!(schedule.tok_starts(), Some(&[0, 3, 3, 8][..]));
//! assert_eq!(schedule.tile_starts(), Some(&[0, 1, 1, 3][..]));
//! assert_eq!(schedule.total_tokens(), Some(8));
//!
//! let tiles: Vec<_> = schedule.tiles().map(|(_, r)| r.decode().unwrap()).collect();
//! assert_eq!(tiles, vec![(0, 0), (0, 2), (1, 2)]);
//! ```

mod config;
mod error;
mod layout;
mod schedule;
mod types;
pub mod timing;
pub mod validation;

// Internal modules
pub(crate) mod metadata;

pub use config::{
    ScanStrategy, ScheduleConfig, DEFAULT_MEMSET_BLOCK, DEFAULT_PARALLEL_SCAN_MIN_GROUPS,
    DEFAULT_SCAN_BLOCK,
};
pub use error::ScheduleError;
pub use layout::{tile_capacity, MetadataLayout};
pub use schedule::Schedule;
pub use types::{TileRecord, ENCODING_LIMIT, SENTINEL};

use metadata::{
    check_group_count, fill_sentinel, scan_blocked, scan_sequential, scatter_tiles, MetadataBuffer,
};
use timing::{Stage, StageTimings, Timer, TimingBuilder};

/// Compute a schedule with default settings.
///
/// `histogram` is `None` when no routing was performed; the result is then an
/// unrouted schedule and no buffer is allocated. `total_work_items` only sizes
/// the tile-info capacity; a histogram needing more tiles than that fails with
/// [`ScheduleError::CapacityExceeded`].
pub fn compute_schedule(
    histogram: Option<&[u32]>,
    total_work_items: usize,
    tile_dim: usize,
) -> Result<Schedule, ScheduleError> {
    compute_schedule_with(histogram, total_work_items, tile_dim, &ScheduleConfig::default())
}

/// Compute a schedule with explicit configuration.
pub fn compute_schedule_with(
    histogram: Option<&[u32]>,
    total_work_items: usize,
    tile_dim: usize,
    config: &ScheduleConfig,
) -> Result<Schedule, ScheduleError> {
    compute_schedule_timed(histogram, total_work_items, tile_dim, config)
        .map(|(schedule, _)| schedule)
}

/// Like [`compute_schedule_with`], also returning per-stage timings.
///
/// Timings are all zero unless the `timing` feature is enabled. Nothing is
/// reported here; call [`StageTimings::report`] to log them.
pub fn compute_schedule_timed(
    histogram: Option<&[u32]>,
    total_work_items: usize,
    tile_dim: usize,
    config: &ScheduleConfig,
) -> Result<(Schedule, StageTimings), ScheduleError> {
    let mut timings = TimingBuilder::new();

    let Some(histogram) = histogram else {
        tracing::debug!("no histogram, returning unrouted schedule");
        return Ok((Schedule::unrouted(), timings.finish()));
    };

    // Layout: everything that can fail on sizing fails here, before allocation.
    let t = Timer::start();
    config.validate()?;
    let num_groups = histogram.len();
    let capacity = tile_capacity(num_groups, total_work_items, tile_dim)?;
    check_group_count(num_groups)?;
    let layout = MetadataLayout::plan(num_groups, tile_dim, capacity)?;
    let scan = config.resolve_scan(num_groups);
    tracing::debug!(
        groups = num_groups,
        tile_dim,
        total_work_items,
        capacity,
        buffer_len = layout.total_len(),
        ?scan,
        "planned schedule layout"
    );
    timings.set(Stage::Layout, t.elapsed());

    let t = Timer::start();
    let mut buffer = MetadataBuffer::allocate(layout);
    fill_sentinel(buffer.as_mut_slice(), config.memset_block);
    timings.set(Stage::Init, t.elapsed());

    let regions = buffer.regions_mut();

    // Scan must finish completely before any group reads its tile offset.
    let t = Timer::start();
    let scan_fn = match scan {
        ScanStrategy::Blocked => scan_blocked,
        ScanStrategy::Sequential | ScanStrategy::Auto => scan_sequential,
    };
    let totals = scan_fn(
        histogram,
        layout.tile_dim(),
        config.scan_block,
        regions.hist,
        regions.tok_starts,
        regions.tile_starts,
    )?;
    timings.set(Stage::Scan, t.elapsed());

    let t = Timer::start();
    scatter_tiles(
        histogram,
        layout.tile_dim(),
        regions.tile_starts,
        regions.tile_info,
    )?;
    timings.set(Stage::Scatter, t.elapsed());

    let t = Timer::start();
    let schedule = Schedule::assemble(buffer);
    timings.set(Stage::Assemble, t.elapsed());

    tracing::debug!(
        groups = num_groups,
        total_tokens = totals.tokens,
        total_tiles = totals.tiles,
        slack = capacity - totals.tiles,
        "schedule built"
    );

    Ok((schedule, timings.finish()))
}
