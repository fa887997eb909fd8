//! Packed per-cell voxel state.
//!
//! A [`Voxel`] is four bytes: a [`BlockId`] plus a [`BlockState`] whose bits
//! hold the rotation index, the segment bits of multi-cell blocks, and
//! free-form user bits.

use serde::{Deserialize, Serialize};

/// Index into the block definition table. Defaults to air.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    /// Empty but loaded space. Always registered first.
    pub const AIR: BlockId = BlockId(0);
    /// Sentinel for "no data available" (unloaded region). Never registered.
    pub const VOID: BlockId = BlockId(u16::MAX);

    /// Position of this id in the definition table.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_void(self) -> bool {
        self == Self::VOID
    }
}

/// Packed block state.
///
/// ```text
/// bits  0..3   rotation index
/// bits  3..6   segment bits (one per rotated axis; non-zero = segment cell)
/// bits  6..8   reserved
/// bits  8..16  user bits
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockState(pub u16);

impl BlockState {
    const ROTATION_MASK: u16 = 0b111;
    const SEGMENT_SHIFT: u16 = 3;
    const SEGMENT_MASK: u16 = 0b111 << Self::SEGMENT_SHIFT;
    const USERBITS_SHIFT: u16 = 8;
    const USERBITS_MASK: u16 = 0xFF << Self::USERBITS_SHIFT;

    /// Largest rotation index that fits in the state bits.
    pub const MAX_ROTATION: u8 = 7;

    /// Builds a state from its parts. `rotation` and `segment` must fit in 3 bits.
    pub fn new(rotation: u8, segment: u8, userbits: u8) -> Self {
        Self(0)
            .with_rotation(rotation)
            .with_segment(segment)
            .with_userbits(userbits)
    }

    /// Rotation variant index (0–7).
    pub fn rotation(self) -> u8 {
        (self.0 & Self::ROTATION_MASK) as u8
    }

    pub fn with_rotation(self, rotation: u8) -> Self {
        debug_assert!(rotation <= Self::MAX_ROTATION);
        Self((self.0 & !Self::ROTATION_MASK) | (u16::from(rotation) & Self::ROTATION_MASK))
    }

    /// Segment bits. Bit `n` set means the origin lies one step back along rotated axis `n`.
    pub fn segment(self) -> u8 {
        ((self.0 & Self::SEGMENT_MASK) >> Self::SEGMENT_SHIFT) as u8
    }

    pub fn with_segment(self, segment: u8) -> Self {
        debug_assert!(segment <= 0b111);
        Self(
            (self.0 & !Self::SEGMENT_MASK)
                | ((u16::from(segment) << Self::SEGMENT_SHIFT) & Self::SEGMENT_MASK),
        )
    }

    /// Returns `true` for a non-origin cell of a multi-cell block.
    pub fn is_segment(self) -> bool {
        self.segment() != 0
    }

    /// Block-specific payload (e.g. open/closed).
    pub fn userbits(self) -> u8 {
        ((self.0 & Self::USERBITS_MASK) >> Self::USERBITS_SHIFT) as u8
    }

    pub fn with_userbits(self, userbits: u8) -> Self {
        Self((self.0 & !Self::USERBITS_MASK) | (u16::from(userbits) << Self::USERBITS_SHIFT))
    }
}

/// One cell of the world: block id plus packed state.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voxel {
    pub id: BlockId,
    pub state: BlockState,
}

static_assertions::assert_eq_size!(Voxel, [u8; 4]);

impl Voxel {
    pub const AIR: Voxel = Voxel {
        id: BlockId::AIR,
        state: BlockState(0),
    };

    /// Placeholder for cells whose chunk is not resident.
    pub const VOID: Voxel = Voxel {
        id: BlockId::VOID,
        state: BlockState(0),
    };

    pub fn new(id: BlockId, state: BlockState) -> Self {
        Self { id, state }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_fields_are_independent() {
        let state = BlockState::new(5, 0b101, 0xAB);
        assert_eq!(state.rotation(), 5);
        assert_eq!(state.segment(), 0b101);
        assert_eq!(state.userbits(), 0xAB);
        assert!(state.is_segment());

        let rotated = state.with_rotation(2);
        assert_eq!(rotated.rotation(), 2);
        assert_eq!(rotated.segment(), 0b101);
        assert_eq!(rotated.userbits(), 0xAB);
    }

    #[test]
    fn test_clearing_segment_keeps_rotation() {
        let state = BlockState::new(3, 0b011, 0).with_segment(0);
        assert!(!state.is_segment());
        assert_eq!(state.rotation(), 3);
    }

    #[test]
    fn test_state_bit_layout() {
        assert_eq!(BlockState::new(1, 0, 0).0, 0b0000_0001);
        assert_eq!(BlockState::new(0, 1, 0).0, 0b0000_1000);
        assert_eq!(BlockState::new(0, 0, 1).0, 0x0100);
    }

    #[test]
    fn test_void_is_distinct_from_air() {
        assert_ne!(Voxel::VOID, Voxel::AIR);
        assert!(Voxel::VOID.id.is_void());
        assert!(!Voxel::AIR.id.is_void());
        assert_eq!(BlockId::AIR.index(), 0);
    }
}
