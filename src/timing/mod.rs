//! Zero-cost stage timing for schedule construction.
//!
//! When the `timing` feature is enabled, this module records per-stage wall
//! time and reports it through `tracing`.
//!
//! When disabled, all types become zero-sized and all methods compile away.

/// Schedule construction stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Layout,
    Init,
    Scan,
    Scatter,
    Assemble,
}

#[cfg(feature = "timing")]
mod real;
#[cfg(not(feature = "timing"))]
mod stub;

#[cfg(feature = "timing")]
pub use real::*;
#[cfg(not(feature = "timing"))]
pub use stub::*;
