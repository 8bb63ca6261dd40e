//! Tunables for schedule construction.

use crate::ScheduleError;

/// Groups per chunk of the prefix scan (BLOCK_N).
pub const DEFAULT_SCAN_BLOCK: usize = 1024;

/// Elements filled per initializer work item.
pub const DEFAULT_MEMSET_BLOCK: usize = 512;

/// `ScanStrategy::Auto` switches to the blocked scan at this many groups.
pub const DEFAULT_PARALLEL_SCAN_MIN_GROUPS: usize = 1 << 16;

const ENV_SCAN: &str = "TILE_SCHEDULE_SCAN";
const ENV_SCAN_BLOCK: &str = "TILE_SCHEDULE_SCAN_BLOCK";
const ENV_MEMSET_BLOCK: &str = "TILE_SCHEDULE_MEMSET_BLOCK";

/// How the prefix scan stage walks the histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStrategy {
    /// One worker, chunks in order, carries propagated chunk to chunk.
    Sequential,
    /// Per-chunk sums in parallel, a short sequential scan over chunk sums,
    /// then per-chunk fill in parallel. Same output as `Sequential`.
    Blocked,
    /// `Blocked` for large group counts (with the `parallel` feature),
    /// `Sequential` otherwise.
    #[default]
    Auto,
}

impl ScanStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Some(Self::Sequential),
            "blocked" | "parallel" => Some(Self::Blocked),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

/// Configuration for schedule computation.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub scan: ScanStrategy,
    /// Groups per scan chunk. Affects only work partitioning, never output.
    pub scan_block: usize,
    /// Buffer elements per initializer work item.
    pub memset_block: usize,
    /// Threshold used by [`ScanStrategy::Auto`].
    pub parallel_scan_min_groups: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            scan: ScanStrategy::Auto,
            scan_block: DEFAULT_SCAN_BLOCK,
            memset_block: DEFAULT_MEMSET_BLOCK,
            parallel_scan_min_groups: DEFAULT_PARALLEL_SCAN_MIN_GROUPS,
        }
    }
}

impl ScheduleConfig {
    /// Defaults with `TILE_SCHEDULE_*` environment overrides applied.
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var(ENV_SCAN) {
            match ScanStrategy::parse(&v) {
                Some(scan) => config.scan = scan,
                None => tracing::warn!(var = ENV_SCAN, value = %v, "ignoring unknown scan strategy"),
            }
        }
        if let Some(n) = env_usize(ENV_SCAN_BLOCK) {
            config.scan_block = n;
        }
        if let Some(n) = env_usize(ENV_MEMSET_BLOCK) {
            config.memset_block = n;
        }
        config
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.scan_block == 0 {
            return Err(ScheduleError::invalid_config("scan_block must be positive"));
        }
        if self.memset_block == 0 {
            return Err(ScheduleError::invalid_config("memset_block must be positive"));
        }
        Ok(())
    }

    /// Resolve `Auto` for a concrete group count.
    pub fn resolve_scan(&self, num_groups: usize) -> ScanStrategy {
        match self.scan {
            ScanStrategy::Auto
                if cfg!(feature = "parallel") && num_groups >= self.parallel_scan_min_groups =>
            {
                ScanStrategy::Blocked
            }
            ScanStrategy::Auto => ScanStrategy::Sequential,
            other => other,
        }
    }
}

fn env_usize(var: &str) -> Option<usize> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!(var, value = %raw, error = %e, "ignoring unparsable override");
            None
        }
    }
}
