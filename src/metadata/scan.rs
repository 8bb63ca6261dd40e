//! Prefix scan stage: histogram copy, token starts and tile starts.
//!
//! Both strategies produce identical output. `scan_sequential` is the
//! reference: one worker walks the histogram chunk by chunk carrying the
//! running token and tile totals. `scan_blocked` computes chunk totals in
//! parallel, scans those, then fills every chunk in parallel from its carry.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::types::tiles_for;
use crate::ScheduleError;

/// Grand totals produced by a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ScanTotals {
    /// `tok_starts[G]`.
    pub(crate) tokens: u32,
    /// `tile_starts[G]`.
    pub(crate) tiles: usize,
}

/// Running (tokens, tiles) sums. Kept in `u64` so overflow past `u32` is
/// detected rather than wrapped.
type Carry = (u64, u64);

#[inline]
fn narrow(value: u64, group: usize) -> Result<u32, ScheduleError> {
    u32::try_from(value).map_err(|_| ScheduleError::OffsetOverflow { group })
}

/// Scan one chunk starting at group `first_group` from `carry`.
///
/// Output slices are the chunk's own windows: `tok_out[i]` is
/// `tok_starts[first_group + i + 1]`. Returns the carry after the chunk.
#[inline]
fn scan_chunk(
    chunk: &[u32],
    tile_dim: u32,
    first_group: usize,
    carry: Carry,
    hist_out: &mut [u32],
    tok_out: &mut [u32],
    tile_out: &mut [u32],
) -> Result<Carry, ScheduleError> {
    debug_assert_eq!(chunk.len(), hist_out.len());
    debug_assert_eq!(chunk.len(), tok_out.len());
    debug_assert_eq!(chunk.len(), tile_out.len());

    hist_out.copy_from_slice(chunk);
    let (mut tok, mut tile) = carry;
    for (i, &count) in chunk.iter().enumerate() {
        tok += u64::from(count);
        tile += u64::from(tiles_for(count, tile_dim));
        tok_out[i] = narrow(tok, first_group + i)?;
        tile_out[i] = narrow(tile, first_group + i)?;
    }
    Ok((tok, tile))
}

/// Totals of one chunk, without writing anything.
#[inline]
fn chunk_sums(chunk: &[u32], tile_dim: u32) -> Carry {
    chunk.iter().fold((0u64, 0u64), |(tok, tile), &count| {
        (
            tok + u64::from(count),
            tile + u64::from(tiles_for(count, tile_dim)),
        )
    })
}

fn check_lengths(histogram: &[u32], hist: &[u32], tok_starts: &[u32], tile_starts: &[u32]) {
    let g = histogram.len();
    assert_eq!(hist.len(), g, "hist region length mismatch");
    assert_eq!(tok_starts.len(), g + 1, "tok_starts region length mismatch");
    assert_eq!(tile_starts.len(), g + 1, "tile_starts region length mismatch");
}

fn totals_from(carry: Carry, num_groups: usize) -> Result<ScanTotals, ScheduleError> {
    let last = num_groups.saturating_sub(1);
    Ok(ScanTotals {
        tokens: narrow(carry.0, last)?,
        tiles: narrow(carry.1, last)? as usize,
    })
}

/// Sequential chunked scan with carry propagation.
pub(crate) fn scan_sequential(
    histogram: &[u32],
    tile_dim: u32,
    block: usize,
    hist: &mut [u32],
    tok_starts: &mut [u32],
    tile_starts: &mut [u32],
) -> Result<ScanTotals, ScheduleError> {
    check_lengths(histogram, hist, tok_starts, tile_starts);
    debug_assert!(block > 0 && tile_dim > 0);

    tok_starts[0] = 0;
    tile_starts[0] = 0;

    let mut carry: Carry = (0, 0);
    for (chunk_idx, chunk) in histogram.chunks(block).enumerate() {
        let start = chunk_idx * block;
        let end = start + chunk.len();
        carry = scan_chunk(
            chunk,
            tile_dim,
            start,
            carry,
            &mut hist[start..end],
            &mut tok_starts[start + 1..end + 1],
            &mut tile_starts[start + 1..end + 1],
        )?;
        tracing::trace!(
            chunk = chunk_idx,
            tok_carry = carry.0,
            tile_carry = carry.1,
            "scan chunk done"
        );
    }

    totals_from(carry, histogram.len())
}

/// Two-pass blocked scan. Output is bit-identical to [`scan_sequential`],
/// including which group an [`ScheduleError::OffsetOverflow`] reports.
pub(crate) fn scan_blocked(
    histogram: &[u32],
    tile_dim: u32,
    block: usize,
    hist: &mut [u32],
    tok_starts: &mut [u32],
    tile_starts: &mut [u32],
) -> Result<ScanTotals, ScheduleError> {
    check_lengths(histogram, hist, tok_starts, tile_starts);
    debug_assert!(block > 0 && tile_dim > 0);

    tok_starts[0] = 0;
    tile_starts[0] = 0;

    // Pass 1: per-chunk totals.
    let sums: Vec<Carry> = maybe_par_chunks!(histogram, block)
        .map(|chunk| chunk_sums(chunk, tile_dim))
        .collect();

    // Exclusive scan of chunk totals (short: G / block entries).
    let mut carries: Vec<Carry> = Vec::with_capacity(sums.len());
    let mut running: Carry = (0, 0);
    for &(tok, tile) in &sums {
        carries.push(running);
        running = (running.0 + tok, running.1 + tile);
    }

    // Pass 2: fill every chunk from its carry.
    let results: Vec<Result<Carry, ScheduleError>> = maybe_par_chunks_mut!(hist, block)
        .zip(maybe_par_chunks_mut!(tok_starts[1..], block))
        .zip(maybe_par_chunks_mut!(tile_starts[1..], block))
        .zip(maybe_par_chunks!(histogram, block))
        .zip(maybe_par_iter!(carries))
        .enumerate()
        .map(|(chunk_idx, ((((hist_out, tok_out), tile_out), chunk), &carry))| {
            scan_chunk(
                chunk,
                tile_dim,
                chunk_idx * block,
                carry,
                hist_out,
                tok_out,
                tile_out,
            )
        })
        .collect();

    // First failing chunk in group order, matching the sequential scan.
    for result in results {
        result?;
    }

    totals_from(running, histogram.len())
}
