use super::Stage;
use std::time::{Duration, Instant};

/// Timer that tracks elapsed time when timing is enabled.
pub struct Timer(Instant);

impl Timer {
    #[inline]
    pub fn start() -> Self {
        Self(Instant::now())
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

/// Wall time per construction stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub total: Duration,
    pub layout: Duration,
    pub init: Duration,
    pub scan: Duration,
    pub scatter: Duration,
    pub assemble: Duration,
}

impl StageTimings {
    pub fn get(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Layout => self.layout,
            Stage::Init => self.init,
            Stage::Scan => self.scan,
            Stage::Scatter => self.scatter,
            Stage::Assemble => self.assemble,
        }
    }

    pub fn report(&self, num_groups: usize) {
        let us = |d: Duration| d.as_secs_f64() * 1e6;
        let total_us = us(self.total);
        let pct = |d: Duration| {
            if total_us > 0.0 {
                us(d) / total_us * 100.0
            } else {
                0.0
            }
        };
        tracing::info!(
            groups = num_groups,
            total_us = total_us,
            layout_us = us(self.layout),
            init_us = us(self.init),
            init_pct = pct(self.init),
            scan_us = us(self.scan),
            scan_pct = pct(self.scan),
            scatter_us = us(self.scatter),
            scatter_pct = pct(self.scatter),
            assemble_us = us(self.assemble),
            "schedule stage timings"
        );
    }
}

/// Builder for collecting stage timings.
pub struct TimingBuilder {
    t_start: Instant,
    timings: StageTimings,
}

impl TimingBuilder {
    pub fn new() -> Self {
        Self {
            t_start: Instant::now(),
            timings: StageTimings::default(),
        }
    }

    pub fn set(&mut self, stage: Stage, d: Duration) {
        let slot = match stage {
            Stage::Layout => &mut self.timings.layout,
            Stage::Init => &mut self.timings.init,
            Stage::Scan => &mut self.timings.scan,
            Stage::Scatter => &mut self.timings.scatter,
            Stage::Assemble => &mut self.timings.assemble,
        };
        *slot = d;
    }

    pub fn finish(self) -> StageTimings {
        StageTimings {
            total: self.t_start.elapsed(),
            ..self.timings
        }
    }
}
