//! Error types for schedule computation.

use thiserror::Error;

/// Errors that can occur while building a tile schedule.
///
/// Every variant is a caller contract violation. Nothing is clamped: a clamped
/// schedule would silently drop work, so the partially built buffer is
/// discarded and the error is returned instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Sizing parameters are unusable (zero tile size, zero block size,
    /// a buffer length that does not fit in memory, ...).
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A group id or local tile index does not fit the 16-bit packing budget.
    ///
    /// `local_tile` is 0 when the group id itself is out of range.
    #[error("tile record encoding overflow: group {group}, local tile {local_tile} (limit 65536 each)")]
    EncodingOverflow { group: usize, local_tile: usize },

    /// A cumulative token or tile offset exceeds the buffer element width.
    #[error("cumulative offset overflow at group {group}: offsets exceed u32 range")]
    OffsetOverflow { group: usize },

    /// The histogram needs more tiles than the planned tile-info capacity.
    #[error("tile capacity exceeded: {required} tiles required, capacity {capacity}")]
    CapacityExceeded { required: usize, capacity: usize },
}

impl ScheduleError {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        ScheduleError::InvalidConfig(msg.into())
    }
}
