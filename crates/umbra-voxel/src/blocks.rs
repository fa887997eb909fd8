//! World-coordinate block access on top of [`ChunkStore`].
//!
//! Every voxel mutation goes through here. Writes keep multi-cell
//! ("extended") blocks consistent: replacing an origin erases its segment
//! cells, and placing an origin writes them. Lighting is never touched; the
//! caller runs the light solvers afterwards.

use std::sync::Arc;

use glam::IVec3;
use tracing::warn;
use umbra_math::{floor_div, floor_mod};

use crate::chunk::{CHUNK_D, CHUNK_W, MODIFIED, UNSAVED};
use crate::chunk_store::ChunkStore;
use crate::error::VoxelError;
use crate::light::Light;
use crate::registry::{BlockDef, segment_bits};
use crate::voxel::{BlockId, BlockState, Voxel};

impl ChunkStore {
    /// Voxel at world position, or `None` when not resident.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<Voxel> {
        let chunk = self.chunk_by_voxel(x, y, z)?;
        Some(chunk.voxel(floor_mod(x, CHUNK_W), y, floor_mod(z, CHUNK_D)))
    }

    /// Mutable voxel at world position.
    ///
    /// Raw access: dirty flags and segment bookkeeping are the caller's job.
    /// Prefer [`ChunkStore::set`].
    pub fn get_mut(&mut self, x: i32, y: i32, z: i32) -> Option<&mut Voxel> {
        let chunk = self.chunk_by_voxel_mut(x, y, z)?;
        Some(chunk.voxel_mut(floor_mod(x, CHUNK_W), y, floor_mod(z, CHUNK_D)))
    }

    pub fn require(&self, x: i32, y: i32, z: i32) -> Result<Voxel, VoxelError> {
        self.get(x, y, z)
            .ok_or(VoxelError::NotResident { x, y, z })
    }

    pub fn require_mut(&mut self, x: i32, y: i32, z: i32) -> Result<&mut Voxel, VoxelError> {
        self.get_mut(x, y, z)
            .ok_or(VoxelError::NotResident { x, y, z })
    }

    /// Packed light at world position; dark when not resident.
    pub fn light(&self, x: i32, y: i32, z: i32) -> Light {
        self.chunk_by_voxel(x, y, z)
            .map_or(Light::DARK, |chunk| {
                chunk
                    .lightmap
                    .get(floor_mod(x, CHUNK_W), y, floor_mod(z, CHUNK_D))
            })
    }

    /// One light channel at world position; 0 when not resident.
    pub fn light_channel(&self, x: i32, y: i32, z: i32, channel: usize) -> u8 {
        self.light(x, y, z).extract(channel)
    }

    /// Writes one light channel. Non-resident cells are ignored.
    pub fn set_light_channel(&mut self, x: i32, y: i32, z: i32, channel: usize, level: u8) {
        if let Some(chunk) = self.chunk_by_voxel_mut(x, y, z) {
            chunk
                .lightmap
                .set_channel(floor_mod(x, CHUNK_W), y, floor_mod(z, CHUNK_D), channel, level);
            chunk.mark_dirty(MODIFIED);
        }
    }

    /// Places block `id` with `state` at a world position.
    ///
    /// A previous extended origin has its segments erased; a new extended
    /// origin gets its segments written. Non-resident positions and `y`
    /// outside the column are ignored.
    ///
    /// # Errors
    ///
    /// [`VoxelError::UnknownBlock`] if `id` is not registered.
    pub fn set(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        id: BlockId,
        state: BlockState,
    ) -> Result<(), VoxelError> {
        let registry = Arc::clone(self.registry());
        let def = registry.try_get(id).ok_or(VoxelError::UnknownBlock(id))?;
        let Some(prev) = self.get(x, y, z) else {
            return Ok(());
        };

        if let Some(prev_def) = registry.try_get(prev.id)
            && prev_def.is_extended()
            && !prev.state.is_segment()
        {
            self.erase_segments(prev_def, prev.state, x, y, z);
        }

        let lx = floor_mod(x, CHUNK_W);
        let lz = floor_mod(z, CHUNK_D);
        if let Some(chunk) = self.chunk_by_voxel_mut(x, y, z) {
            *chunk.voxel_mut(lx, y, lz) = Voxel::new(id, state);
            chunk.note_write(y, id);
            chunk.mark_dirty(MODIFIED | UNSAVED);
        }
        self.mark_border_neighbors(x, z, lx, lz);

        if def.is_extended() && !state.is_segment() {
            self.restore_segments(def, state, x, y, z);
        }
        Ok(())
    }

    /// Finds the origin cell of the extended block covering `pos`.
    ///
    /// Follows segment bits back along the rotation axes. Stops at the first
    /// non-segment cell, or at the last step if it lands outside the store.
    pub fn seek_origin(&self, pos: IVec3, def: &BlockDef, state: BlockState) -> IVec3 {
        let axes = def.coord_system(state.rotation()).axes;
        let mut pos = pos;
        let mut segment = state.segment();
        while segment != 0 {
            for (bit, axis) in axes.iter().enumerate() {
                if segment & (1 << bit) != 0 {
                    pos -= *axis;
                }
            }
            match self.get(pos.x, pos.y, pos.z) {
                Some(voxel) => segment = voxel.state.segment(),
                None => break,
            }
        }
        pos
    }

    /// Clears every non-origin footprint cell still holding this block to air.
    pub fn erase_segments(&mut self, def: &BlockDef, state: BlockState, x: i32, y: i32, z: i32) {
        let origin = IVec3::new(x, y, z);
        for (local, offset) in def.footprint(state.rotation()) {
            if local == IVec3::ZERO {
                continue;
            }
            let pos = origin + offset;
            if self.get(pos.x, pos.y, pos.z).is_some_and(|v| v.id == def.id()) {
                self.write_voxel(pos, Voxel::AIR);
            }
        }
    }

    /// Writes every non-origin footprint cell as a segment of this block.
    pub fn restore_segments(&mut self, def: &BlockDef, state: BlockState, x: i32, y: i32, z: i32) {
        let origin = IVec3::new(x, y, z);
        for (local, offset) in def.footprint(state.rotation()) {
            if local == IVec3::ZERO {
                continue;
            }
            let pos = origin + offset;
            let segment_state = state.with_segment(segment_bits(local));
            // Segment writes never recurse back into restore.
            if let Err(e) = self.set(pos.x, pos.y, pos.z, def.id(), segment_state) {
                warn!(block = %def.name, position = ?pos, "segment not restored: {e}");
            }
        }
    }

    /// Returns `true` if every footprint cell is resident and either
    /// replaceable or holds `ignore`.
    pub fn check_replaceability(
        &self,
        def: &BlockDef,
        state: BlockState,
        origin: IVec3,
        ignore: BlockId,
    ) -> bool {
        let registry = self.registry();
        def.footprint(state.rotation()).all(|(_, offset)| {
            let pos = origin + offset;
            self.get(pos.x, pos.y, pos.z).is_some_and(|voxel| {
                voxel.id == ignore
                    || registry.try_get(voxel.id).is_some_and(|d| d.replaceable)
            })
        })
    }

    /// Rotates the block at a world position.
    ///
    /// Ignored for non-rotatable blocks, unchanged indices and indices the
    /// block's profile does not define. Extended blocks rotate around their
    /// origin.
    pub fn set_rotation(&mut self, x: i32, y: i32, z: i32, index: u8) {
        let Some(voxel) = self.get(x, y, z) else {
            return;
        };
        let registry = Arc::clone(self.registry());
        let Some(def) = registry.try_get(voxel.id) else {
            return;
        };
        if !def.is_rotatable()
            || voxel.state.rotation() == index
            || index as usize >= def.rotation.variants().len()
        {
            return;
        }
        if def.is_extended() {
            let origin = self.seek_origin(IVec3::new(x, y, z), def, voxel.state);
            let Some(origin_voxel) = self.get(origin.x, origin.y, origin.z) else {
                return;
            };
            self.set_rotation_extended(def, origin_voxel.state, origin, index);
        } else {
            self.write_voxel(
                IVec3::new(x, y, z),
                Voxel::new(voxel.id, voxel.state.with_rotation(index)),
            );
        }
    }

    /// Re-lays an extended block's footprint for rotation `index`.
    ///
    /// Does nothing if the new footprint overlaps anything that is neither
    /// replaceable nor part of this block.
    pub fn set_rotation_extended(
        &mut self,
        def: &BlockDef,
        state: BlockState,
        origin: IVec3,
        index: u8,
    ) {
        let new_state = state.with_rotation(index);
        if !self.check_replaceability(def, new_state, origin, def.id()) {
            return;
        }

        let mut covered = Vec::new();
        for (local, offset) in def.footprint(index) {
            let pos = origin + offset;
            let cell_state = new_state.with_segment(segment_bits(local));
            match self.get(pos.x, pos.y, pos.z) {
                Some(voxel) if voxel.id == def.id() => {
                    self.write_voxel(pos, Voxel::new(def.id(), cell_state));
                }
                Some(_) => {
                    if let Err(e) = self.set(pos.x, pos.y, pos.z, def.id(), cell_state) {
                        warn!(block = %def.name, position = ?pos, "rotated cell not written: {e}");
                    }
                }
                None => {}
            }
            covered.push(pos);
        }

        for (_, offset) in def.footprint(state.rotation()) {
            let pos = origin + offset;
            if !covered.contains(&pos)
                && let Err(e) = self.set(pos.x, pos.y, pos.z, BlockId::AIR, BlockState::default())
            {
                warn!(block = %def.name, position = ?pos, "vacated cell not cleared: {e}");
            }
        }
    }

    /// Resident and a full solid cube.
    pub fn is_solid_block(&self, x: i32, y: i32, z: i32) -> bool {
        self.def_at(x, y, z).is_some_and(|def| def.solid)
    }

    pub fn is_replaceable_block(&self, x: i32, y: i32, z: i32) -> bool {
        self.def_at(x, y, z).is_some_and(|def| def.replaceable)
    }

    pub fn is_obstacle_block(&self, x: i32, y: i32, z: i32) -> bool {
        self.def_at(x, y, z).is_some_and(|def| def.obstacle)
    }

    fn def_at(&self, x: i32, y: i32, z: i32) -> Option<&BlockDef> {
        let voxel = self.get(x, y, z)?;
        self.registry().try_get(voxel.id)
    }

    /// Overwrites a voxel without segment handling.
    fn write_voxel(&mut self, pos: IVec3, voxel: Voxel) {
        let lx = floor_mod(pos.x, CHUNK_W);
        let lz = floor_mod(pos.z, CHUNK_D);
        if let Some(chunk) = self.chunk_by_voxel_mut(pos.x, pos.y, pos.z) {
            *chunk.voxel_mut(lx, pos.y, lz) = voxel;
            chunk.note_write(pos.y, voxel.id);
            chunk.mark_dirty(MODIFIED | UNSAVED);
        }
        self.mark_border_neighbors(pos.x, pos.z, lx, lz);
    }

    /// Marks chunks sharing a face with a border cell as modified.
    fn mark_border_neighbors(&mut self, x: i32, z: i32, lx: i32, lz: i32) {
        let cx = floor_div(x, CHUNK_W);
        let cz = floor_div(z, CHUNK_D);
        let mut neighbors = Vec::with_capacity(2);
        if lx == 0 {
            neighbors.push((cx - 1, cz));
        } else if lx == CHUNK_W - 1 {
            neighbors.push((cx + 1, cz));
        }
        if lz == 0 {
            neighbors.push((cx, cz - 1));
        } else if lz == CHUNK_D - 1 {
            neighbors.push((cx, cz + 1));
        }
        for (nx, nz) in neighbors {
            // Already-flagged neighbours are left alone so shared handles stay shared.
            let needs_flag = self
                .chunk(nx, nz)
                .is_some_and(|chunk| !chunk.is_dirty(MODIFIED));
            if needs_flag && let Some(chunk) = self.chunk_mut(nx, nz) {
                chunk.mark_dirty(MODIFIED);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
