//! Structural validation of computed schedules.
//!
//! Recomputes every region from the histogram independently of the scan and
//! scatter stages and counts disagreements. Useful for tests, benchmarks, and
//! checking buffers produced by other implementations of the same layout.

use crate::{Schedule, TileRecord};

/// Detailed validation report for a schedule.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// The schedule had no buffer (histogram was absent).
    pub unrouted: bool,
    /// Number of groups in the histogram.
    pub num_groups: usize,
    /// Buffer layout did not match the histogram length.
    pub group_count_mismatch: bool,

    /// Expected `tok_starts[G]`.
    pub expected_tokens: u64,
    /// Expected `tile_starts[G]`.
    pub expected_tiles: u64,
    /// Declared tile-info capacity.
    pub capacity: usize,

    /// `hist[i] != histogram[i]`.
    pub hist_mismatches: usize,
    /// Entries of `tok_starts` differing from the exclusive prefix sum.
    pub tok_start_mismatches: usize,
    /// Entries of `tile_starts` differing from the exclusive prefix sum of tile counts.
    pub tile_start_mismatches: usize,
    /// Slots inside some group's range holding the wrong record.
    pub misplaced_records: usize,
    /// Slots outside every group's range that are not the sentinel.
    pub dirty_slack: usize,
    /// Expected tiles do not fit the declared capacity.
    pub capacity_exceeded: bool,
    /// `total_tokens()` disagrees with the histogram sum.
    pub total_tokens_mismatch: bool,
}

impl ValidationReport {
    /// Every region matches the histogram exactly.
    pub fn is_valid(&self) -> bool {
        !self.unrouted
            && !self.group_count_mismatch
            && self.hist_mismatches == 0
            && self.tok_start_mismatches == 0
            && self.tile_start_mismatches == 0
            && self.misplaced_records == 0
            && self.dirty_slack == 0
            && !self.capacity_exceeded
            && !self.total_tokens_mismatch
    }

    /// Unused capacity after the last live tile.
    pub fn slack(&self) -> usize {
        self.capacity.saturating_sub(self.expected_tiles as usize)
    }

    /// Format a summary of any issues found.
    pub fn summary(&self) -> String {
        if self.unrouted {
            return "Unrouted".to_string();
        }
        if self.is_valid() {
            return "Valid".to_string();
        }

        let mut issues = Vec::new();
        if self.group_count_mismatch {
            issues.push("group count differs from histogram".to_string());
        }
        if self.hist_mismatches > 0 {
            issues.push(format!("{} hist mismatches", self.hist_mismatches));
        }
        if self.tok_start_mismatches > 0 {
            issues.push(format!("{} tok_starts mismatches", self.tok_start_mismatches));
        }
        if self.tile_start_mismatches > 0 {
            issues.push(format!(
                "{} tile_starts mismatches",
                self.tile_start_mismatches
            ));
        }
        if self.misplaced_records > 0 {
            issues.push(format!("{} misplaced records", self.misplaced_records));
        }
        if self.dirty_slack > 0 {
            issues.push(format!("{} non-sentinel slack slots", self.dirty_slack));
        }
        if self.capacity_exceeded {
            issues.push(format!(
                "{} tiles exceed capacity {}",
                self.expected_tiles, self.capacity
            ));
        }
        if self.total_tokens_mismatch {
            issues.push(format!("total_tokens != {}", self.expected_tokens));
        }
        issues.join(", ")
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "G={} tokens={} tiles={}/{}: {}",
            self.num_groups,
            self.expected_tokens,
            self.expected_tiles,
            self.capacity,
            self.summary()
        )
    }
}

/// Validate `schedule` against the histogram and tile size it was built from.
pub fn validate(schedule: &Schedule, histogram: &[u32], tile_dim: u32) -> ValidationReport {
    let mut report = ValidationReport {
        num_groups: histogram.len(),
        ..Default::default()
    };

    let (Some(hist), Some(tok_starts), Some(tile_starts), Some(records)) = (
        schedule.hist(),
        schedule.tok_starts(),
        schedule.tile_starts(),
        schedule.tile_records(),
    ) else {
        report.unrouted = true;
        return report;
    };
    report.capacity = records.len();

    if hist.len() != histogram.len() {
        report.group_count_mismatch = true;
        return report;
    }

    report.hist_mismatches = hist
        .iter()
        .zip(histogram)
        .filter(|(a, b)| a != b)
        .count();

    let tile_dim = u64::from(tile_dim.max(1));
    let mut tok = 0u64;
    let mut tile = 0u64;
    let mut expected_tok = Vec::with_capacity(histogram.len() + 1);
    let mut expected_tile = Vec::with_capacity(histogram.len() + 1);
    expected_tok.push(0u64);
    expected_tile.push(0u64);
    for &count in histogram {
        tok += u64::from(count);
        tile += u64::from(count).div_ceil(tile_dim);
        expected_tok.push(tok);
        expected_tile.push(tile);
    }
    report.expected_tokens = tok;
    report.expected_tiles = tile;
    report.tok_start_mismatches = count_mismatches(tok_starts, &expected_tok);
    report.tile_start_mismatches = count_mismatches(tile_starts, &expected_tile);
    report.total_tokens_mismatch = schedule.total_tokens().map(u64::from) != Some(tok);
    report.capacity_exceeded = tile > records.len() as u64;

    // Walk the expected live ranges; everything past them must be sentinel.
    let mut slot = 0usize;
    for (group, &count) in histogram.iter().enumerate() {
        let tiles = u64::from(count).div_ceil(tile_dim) as usize;
        for local in 0..tiles {
            let Some(record) = records.get(slot) else {
                break;
            };
            if !record_matches(*record, local, group) {
                report.misplaced_records += 1;
            }
            slot += 1;
        }
    }
    report.dirty_slack = records
        .get(slot..)
        .unwrap_or(&[])
        .iter()
        .filter(|r| !r.is_sentinel())
        .count();

    report
}

fn count_mismatches(actual: &[u32], expected: &[u64]) -> usize {
    actual
        .iter()
        .zip(expected)
        .filter(|(&a, &e)| u64::from(a) != e)
        .count()
}

fn record_matches(record: TileRecord, local: usize, group: usize) -> bool {
    record
        .decode()
        .is_some_and(|(l, g)| usize::from(l) == local && usize::from(g) == group)
}
