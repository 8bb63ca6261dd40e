//! Core types for tile schedules.

use bytemuck::{Pod, Zeroable};

use crate::ScheduleError;

/// Reserved "no tile" marker. Every metadata slot starts out as this value.
pub const SENTINEL: u32 = u32::MAX;

/// Exclusive upper bound for both packed fields of a [`TileRecord`].
pub const ENCODING_LIMIT: usize = 1 << 16;

const GROUP_MASK: u32 = 0xFFFF;
const LOCAL_SHIFT: u32 = 16;

/// One entry of the tile-info table: `(local_tile_index << 16) | group_id`.
///
/// `#[repr(transparent)]` over `u32`, so a `&[u32]` tile-info region can be
/// viewed as `&[TileRecord]` without copying.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct TileRecord(u32);

impl TileRecord {
    /// The unused-slot marker.
    pub const SENTINEL: Self = Self(SENTINEL);

    /// Pack a record, rejecting fields that would not survive the 16-bit encoding.
    #[inline]
    pub fn new(local_tile: usize, group: usize) -> Result<Self, ScheduleError> {
        if group >= ENCODING_LIMIT {
            return Err(ScheduleError::EncodingOverflow {
                group,
                local_tile: 0,
            });
        }
        if local_tile >= ENCODING_LIMIT {
            return Err(ScheduleError::EncodingOverflow { group, local_tile });
        }
        // (0xFFFF, 0xFFFF) packs to the sentinel and would read back as "no tile".
        if local_tile == ENCODING_LIMIT - 1 && group == ENCODING_LIMIT - 1 {
            return Err(ScheduleError::EncodingOverflow { group, local_tile });
        }
        Ok(Self::pack(local_tile as u32, group as u32))
    }

    /// Pack without range checks. Callers must have validated both fields.
    #[inline(always)]
    pub(crate) fn pack(local_tile: u32, group: u32) -> Self {
        debug_assert!((local_tile as usize) < ENCODING_LIMIT, "local tile out of range");
        debug_assert!((group as usize) < ENCODING_LIMIT, "group out of range");
        debug_assert!(
            (local_tile, group) != (GROUP_MASK, GROUP_MASK),
            "record collides with sentinel"
        );
        Self((local_tile << LOCAL_SHIFT) | group)
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_sentinel(self) -> bool {
        self.0 == SENTINEL
    }

    /// Group id (low 16 bits). Meaningless for the sentinel.
    #[inline]
    pub const fn group(self) -> u16 {
        (self.0 & GROUP_MASK) as u16
    }

    /// Tile index within its group (high 16 bits). Meaningless for the sentinel.
    #[inline]
    pub const fn local_tile(self) -> u16 {
        (self.0 >> LOCAL_SHIFT) as u16
    }

    /// `(local_tile, group)`, or `None` for the sentinel.
    #[inline]
    pub fn decode(self) -> Option<(u16, u16)> {
        if self.is_sentinel() {
            None
        } else {
            Some((self.local_tile(), self.group()))
        }
    }
}

impl std::fmt::Debug for TileRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.decode() {
            Some((local, group)) => write!(f, "TileRecord({local}, {group})"),
            None => f.write_str("TileRecord(SENTINEL)"),
        }
    }
}

impl From<TileRecord> for u32 {
    #[inline]
    fn from(value: TileRecord) -> Self {
        value.0
    }
}

/// Number of tiles needed to cover `count` work items.
#[inline(always)]
pub(crate) fn tiles_for(count: u32, tile_dim: u32) -> u32 {
    count.div_ceil(tile_dim)
}
