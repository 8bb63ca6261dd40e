use super::Stage;
use std::time::Duration;

/// Dummy timer when `timing` is disabled (zero-sized).
pub struct Timer;

impl Timer {
    #[inline(always)]
    pub fn start() -> Self {
        Self
    }

    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        Duration::ZERO
    }
}

/// Dummy timings when `timing` is disabled (zero-sized).
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings;

impl StageTimings {
    #[inline(always)]
    pub fn get(&self, _stage: Stage) -> Duration {
        Duration::ZERO
    }

    #[inline(always)]
    pub fn report(&self, _num_groups: usize) {}
}

/// Dummy builder when `timing` is disabled.
pub struct TimingBuilder;

impl TimingBuilder {
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }

    #[inline(always)]
    pub fn set(&mut self, _stage: Stage, _d: Duration) {}

    #[inline(always)]
    pub fn finish(self) -> StageTimings {
        StageTimings
    }
}
