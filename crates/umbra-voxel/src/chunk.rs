//! Fixed-size 16×256×16 voxel column with a parallel light buffer.
//!
//! Cells are laid out with x varying fastest, then z, then y, so one
//! horizontal layer is contiguous.

use serde::{Deserialize, Serialize};

use crate::light::Lightmap;
use crate::voxel::{BlockId, Voxel};

/// Chunk width (x) in voxels.
pub const CHUNK_W: i32 = 16;
/// Chunk height (y) in voxels.
pub const CHUNK_H: i32 = 256;
/// Chunk depth (z) in voxels.
pub const CHUNK_D: i32 = 16;
/// Total number of voxels in a chunk.
pub const CHUNK_VOLUME: usize = (CHUNK_W * CHUNK_H * CHUNK_D) as usize;

/// Dirty-flag bit: voxels or light changed since the consumer last looked.
pub const MODIFIED: u8 = 0b0000_0001;
/// Dirty-flag bit: chunk differs from its persisted copy.
pub const UNSAVED: u8 = 0b0000_0010;
/// Dirty-flag bit: initial lighting has been computed.
pub const LIGHTED: u8 = 0b0000_0100;

/// Linear index of `(x, y, z)` in a dense `w × ? × d` array.
#[inline]
pub fn vox_index(x: i32, y: i32, z: i32, w: i32, d: i32) -> usize {
    ((y * d + z) * w + x) as usize
}

/// One grid cell of the world: voxels, light, and bookkeeping.
///
/// A chunk is always fully valid. It is shared between the store and the
/// persistence collaborator through `Arc`, and mutated copy-on-write.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk-grid X coordinate.
    pub x: i32,
    /// Chunk-grid Z coordinate.
    pub z: i32,
    voxels: Box<[Voxel]>,
    /// Light values parallel to `voxels`.
    pub lightmap: Lightmap,
    /// One past the highest non-air row (conservative).
    top: i32,
    /// Lowest non-air row (conservative).
    bottom: i32,
    flags: u8,
}

impl Chunk {
    /// Creates an all-air, all-dark chunk at grid position `(x, z)`.
    pub fn new(x: i32, z: i32) -> Self {
        Self {
            x,
            z,
            voxels: vec![Voxel::AIR; CHUNK_VOLUME].into_boxed_slice(),
            lightmap: Lightmap::new_dark(),
            top: 0,
            bottom: 0,
            flags: 0,
        }
    }

    /// Voxel at chunk-local coordinates.
    #[inline]
    pub fn voxel(&self, lx: i32, y: i32, lz: i32) -> Voxel {
        self.voxels[Self::local_index(lx, y, lz)]
    }

    /// Mutable voxel at chunk-local coordinates. Callers manage dirty flags.
    #[inline]
    pub fn voxel_mut(&mut self, lx: i32, y: i32, lz: i32) -> &mut Voxel {
        &mut self.voxels[Self::local_index(lx, y, lz)]
    }

    /// Raw voxels in chunk order.
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Mutable raw voxels, for generators filling a fresh chunk.
    ///
    /// Call [`Chunk::update_heights`] afterwards.
    pub fn voxels_mut(&mut self) -> &mut [Voxel] {
        &mut self.voxels
    }

    /// Fills a horizontal slab `y0..y1` with `id`. Generator helper.
    pub fn fill_layers(&mut self, y0: i32, y1: i32, id: BlockId) {
        let y0 = y0.clamp(0, CHUNK_H);
        let y1 = y1.clamp(0, CHUNK_H);
        if y0 >= y1 {
            return;
        }
        let start = vox_index(0, y0, 0, CHUNK_W, CHUNK_D);
        let end = vox_index(0, y1, 0, CHUNK_W, CHUNK_D);
        self.voxels[start..end].fill(Voxel::new(id, Default::default()));
        self.update_heights();
        self.mark_dirty(MODIFIED | UNSAVED);
    }

    /// Recomputes `top` and `bottom` from the voxel contents.
    pub fn update_heights(&mut self) {
        let layer = (CHUNK_W * CHUNK_D) as usize;
        let first = self.voxels.iter().position(|v| v.id != BlockId::AIR);
        let last = self.voxels.iter().rposition(|v| v.id != BlockId::AIR);
        match (first, last) {
            (Some(first), Some(last)) => {
                self.bottom = (first / layer) as i32;
                self.top = (last / layer) as i32 + 1;
            }
            _ => {
                self.bottom = 0;
                self.top = 0;
            }
        }
    }

    /// Widens the non-air bounds after a write at row `y`.
    pub(crate) fn note_write(&mut self, y: i32, id: BlockId) {
        if y < self.bottom {
            self.bottom = y;
        } else if y + 1 > self.top {
            self.top = y + 1;
        } else if id == BlockId::AIR {
            self.update_heights();
        }
    }

    /// One past the highest row that may contain a non-air block.
    pub fn top(&self) -> i32 {
        self.top
    }

    /// Lowest row that may contain a non-air block.
    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    /// Returns the current dirty flags.
    pub fn dirty_flags(&self) -> u8 {
        self.flags
    }

    /// Returns `true` if the specified dirty flag (or combination) is set.
    pub fn is_dirty(&self, flag: u8) -> bool {
        self.flags & flag == flag
    }

    pub fn mark_dirty(&mut self, flags: u8) {
        self.flags |= flags;
    }

    pub fn clear_dirty(&mut self, flags: u8) {
        self.flags &= !flags;
    }

    fn local_index(lx: i32, y: i32, lz: i32) -> usize {
        debug_assert!((0..CHUNK_W).contains(&lx), "local x out of range: {lx}");
        debug_assert!((0..CHUNK_H).contains(&y), "y out of range: {y}");
        debug_assert!((0..CHUNK_D).contains(&lz), "local z out of range: {lz}");
        vox_index(lx, y, lz, CHUNK_W, CHUNK_D)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::BlockState;

    #[test]
    fn test_new_chunk_is_air_and_clean() {
        let chunk = Chunk::new(3, -2);
        assert_eq!((chunk.x, chunk.z), (3, -2));
        assert_eq!(chunk.voxel(0, 0, 0), Voxel::AIR);
        assert_eq!(chunk.voxel(15, 255, 15), Voxel::AIR);
        assert_eq!(chunk.dirty_flags(), 0);
        assert_eq!(chunk.voxels().len(), CHUNK_VOLUME);
    }

    #[test]
    fn test_index_layout_is_layer_major() {
        assert_eq!(vox_index(1, 0, 0, CHUNK_W, CHUNK_D), 1);
        assert_eq!(vox_index(0, 0, 1, CHUNK_W, CHUNK_D), 16);
        assert_eq!(vox_index(0, 1, 0, CHUNK_W, CHUNK_D), 256);
    }

    #[test]
    fn test_fill_layers_updates_heights() {
        let mut chunk = Chunk::new(0, 0);
        chunk.fill_layers(10, 20, BlockId(1));
        assert_eq!(chunk.bottom(), 10);
        assert_eq!(chunk.top(), 20);
        assert_eq!(chunk.voxel(7, 15, 7).id, BlockId(1));
        assert_eq!(chunk.voxel(7, 20, 7).id, BlockId::AIR);
        assert!(chunk.is_dirty(MODIFIED | UNSAVED));
    }

    #[test]
    fn test_voxel_mut_writes_in_place() {
        let mut chunk = Chunk::new(0, 0);
        *chunk.voxel_mut(1, 2, 3) = Voxel::new(BlockId(4), BlockState::new(1, 0, 0));
        assert_eq!(chunk.voxel(1, 2, 3).id, BlockId(4));
        assert_eq!(chunk.voxel(1, 2, 3).state.rotation(), 1);
    }

    #[test]
    fn test_clear_one_flag_preserves_others() {
        let mut chunk = Chunk::new(0, 0);
        chunk.mark_dirty(MODIFIED | UNSAVED);
        chunk.clear_dirty(MODIFIED);
        assert!(!chunk.is_dirty(MODIFIED));
        assert!(chunk.is_dirty(UNSAVED));
    }

    #[test]
    fn test_chunk_survives_persistence_handoff() {
        let mut chunk = Chunk::new(-1, 4);
        chunk.fill_layers(0, 3, BlockId(2));
        *chunk.voxel_mut(5, 3, 9) = Voxel::new(BlockId(7), BlockState::new(2, 0, 1));
        chunk.lightmap.set_sun(5, 4, 9, 15);

        let json = serde_json::to_string(&chunk).unwrap();
        let restored: Chunk = serde_json::from_str(&json).unwrap();
        assert_eq!((restored.x, restored.z), (-1, 4));
        assert_eq!(restored.voxels(), chunk.voxels());
        assert_eq!(restored.lightmap.sun(5, 4, 9), 15);
        assert_eq!(restored.top(), chunk.top());
    }
}
