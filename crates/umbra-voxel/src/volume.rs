//! Dense cross-chunk copies of a world region for consumers such as mesh
//! builders, plus 2D/3D downsampling of those copies.

use glam::IVec3;
use umbra_math::floor_div;

use crate::chunk::{CHUNK_D, CHUNK_H, CHUNK_W, vox_index};
use crate::chunk_store::ChunkStore;
use crate::light::{CHANNEL_BLUE, CHANNEL_GREEN, CHANNEL_RED, Light};
use crate::registry::BlockRegistry;
use crate::voxel::{BlockId, Voxel};

/// A `w × h × d` box of voxels and lights anchored at world `(x, y, z)`.
///
/// Cells never filled from a resident chunk hold [`Voxel::VOID`] and dark light.
#[derive(Clone, Debug)]
pub struct VoxelsVolume {
    x: i32,
    y: i32,
    z: i32,
    w: i32,
    h: i32,
    d: i32,
    voxels: Box<[Voxel]>,
    lights: Box<[Light]>,
}

impl VoxelsVolume {
    /// Creates a volume at the world origin.
    ///
    /// # Panics
    ///
    /// Panics if any dimension is not positive.
    pub fn new(w: i32, h: i32, d: i32) -> Self {
        Self::with_position(0, 0, 0, w, h, d)
    }

    pub fn with_position(x: i32, y: i32, z: i32, w: i32, h: i32, d: i32) -> Self {
        assert!(w > 0 && h > 0 && d > 0, "empty volume: {w}x{h}x{d}");
        let volume = (w * h * d) as usize;
        Self {
            x,
            y,
            z,
            w,
            h,
            d,
            voxels: vec![Voxel::VOID; volume].into_boxed_slice(),
            lights: vec![Light::DARK; volume].into_boxed_slice(),
        }
    }

    /// Moves the anchor without touching contents.
    pub fn set_position(&mut self, x: i32, y: i32, z: i32) {
        self.x = x;
        self.y = y;
        self.z = z;
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    pub fn w(&self) -> i32 {
        self.w
    }

    pub fn h(&self) -> i32 {
        self.h
    }

    pub fn d(&self) -> i32 {
        self.d
    }

    pub fn position(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    pub fn size(&self) -> IVec3 {
        IVec3::new(self.w, self.h, self.d)
    }

    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    pub fn voxels_mut(&mut self) -> &mut [Voxel] {
        &mut self.voxels
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut [Light] {
        &mut self.lights
    }

    /// Voxel at world `(bx, by, bz)`; [`Voxel::VOID`] outside the volume.
    pub fn pick_block(&self, bx: i32, by: i32, bz: i32) -> Voxel {
        self.local_index(bx, by, bz)
            .map_or(Voxel::VOID, |index| self.voxels[index])
    }

    pub fn pick_block_id(&self, bx: i32, by: i32, bz: i32) -> BlockId {
        self.pick_block(bx, by, bz).id
    }

    /// Light at world `(bx, by, bz)`; dark outside the volume.
    pub fn pick_light(&self, bx: i32, by: i32, bz: i32) -> Light {
        self.local_index(bx, by, bz)
            .map_or(Light::DARK, |index| self.lights[index])
    }

    /// Downsamples into a smaller volume.
    ///
    /// Each destination cell covers a `w/dst.w × h/dst.h × d/dst.d` block of
    /// source cells. The last full-solid voxel in scan order wins; when none
    /// is solid the destination is air carrying the first non-zero light of
    /// the non-solid cells. Void cells are skipped.
    ///
    /// # Panics
    ///
    /// Panics if the destination is larger than the source or does not
    /// divide it evenly.
    pub fn compress_into(&self, dst: &mut VoxelsVolume, registry: &BlockRegistry) {
        assert!(
            dst.w <= self.w && dst.h <= self.h && dst.d <= self.d,
            "destination {}x{}x{} larger than source {}x{}x{}",
            dst.w,
            dst.h,
            dst.d,
            self.w,
            self.h,
            self.d
        );
        assert!(
            self.w % dst.w == 0 && self.h % dst.h == 0 && self.d % dst.d == 0,
            "destination must divide the source evenly"
        );
        let step_w = self.w / dst.w;
        let step_h = self.h / dst.h;
        let step_d = self.d / dst.d;

        for y in 0..dst.h {
            for z in 0..dst.d {
                for x in 0..dst.w {
                    let mut selected = Voxel::AIR;
                    let mut light = Light::DARK;
                    for ly in 0..step_h {
                        for lz in 0..step_d {
                            for lx in 0..step_w {
                                let src = vox_index(
                                    x * step_w + lx,
                                    y * step_h + ly,
                                    z * step_d + lz,
                                    self.w,
                                    self.d,
                                );
                                let voxel = self.voxels[src];
                                if voxel.id.is_void() {
                                    continue;
                                }
                                let solid = registry.try_get(voxel.id).is_some_and(|def| def.solid);
                                if solid {
                                    selected = voxel;
                                } else if light == Light::DARK {
                                    light = self.lights[src];
                                }
                            }
                        }
                    }
                    let index = vox_index(x, y, z, dst.w, dst.d);
                    dst.voxels[index] = selected;
                    dst.lights[index] = light;
                }
            }
        }
    }

    fn local_index(&self, bx: i32, by: i32, bz: i32) -> Option<usize> {
        let (lx, ly, lz) = (bx - self.x, by - self.y, bz - self.z);
        if lx < 0 || ly < 0 || lz < 0 || lx >= self.w || ly >= self.h || lz >= self.d {
            return None;
        }
        Some(vox_index(lx, ly, lz, self.w, self.d))
    }
}

/// Brightens color channels by one for display; sun is unchanged.
fn apply_backlight(light: Light) -> Light {
    let boost = |channel| (light.extract(channel) + 1).min(Light::MAX_LEVEL);
    Light::combine(
        boost(CHANNEL_RED),
        boost(CHANNEL_GREEN),
        boost(CHANNEL_BLUE),
        light.sun(),
    )
}

impl ChunkStore {
    /// Copies the box at `pos` of extent `size` into dense buffers laid out
    /// `(y * size.z + z) * size.x + x`.
    ///
    /// Only rows below `min(size.y, top)` are written. Cells in missing
    /// chunks or outside the column become `(VOID, dark)`. With `backlight`,
    /// light-passing cells get their color channels raised by one.
    pub fn get_voxels(
        &self,
        voxels: &mut [Voxel],
        lights: &mut [Light],
        pos: IVec3,
        size: IVec3,
        backlight: bool,
        top: i32,
    ) {
        let volume = (size.x * size.y * size.z).max(0) as usize;
        debug_assert!(voxels.len() >= volume && lights.len() >= volume);
        let h = size.y.min(top);
        if size.x <= 0 || size.z <= 0 || h <= 0 {
            return;
        }
        let registry = self.registry();

        let start_cx = floor_div(pos.x, CHUNK_W);
        let start_cz = floor_div(pos.z, CHUNK_D);
        let end_cx = floor_div(pos.x + size.x - 1, CHUNK_W);
        let end_cz = floor_div(pos.z + size.z - 1, CHUNK_D);

        for cz in start_cz..=end_cz {
            for cx in start_cx..=end_cx {
                let chunk = self.chunk(cx, cz);
                let z0 = pos.z.max(cz * CHUNK_D);
                let z1 = (pos.z + size.z).min((cz + 1) * CHUNK_D);
                let x0 = pos.x.max(cx * CHUNK_W);
                let x1 = (pos.x + size.x).min((cx + 1) * CHUNK_W);
                for wy in pos.y..pos.y + h {
                    for wz in z0..z1 {
                        for wx in x0..x1 {
                            let index =
                                vox_index(wx - pos.x, wy - pos.y, wz - pos.z, size.x, size.z);
                            let Some(chunk) = chunk.filter(|_| (0..CHUNK_H).contains(&wy)) else {
                                voxels[index] = Voxel::VOID;
                                lights[index] = Light::DARK;
                                continue;
                            };
                            let (lx, lz) = (wx - cx * CHUNK_W, wz - cz * CHUNK_D);
                            let voxel = chunk.voxel(lx, wy, lz);
                            let mut light = chunk.lightmap.get(lx, wy, lz);
                            if backlight && registry.is_light_passing(voxel.id) {
                                light = apply_backlight(light);
                            }
                            voxels[index] = voxel;
                            lights[index] = light;
                        }
                    }
                }
            }
        }
    }

    /// [`ChunkStore::get_voxels`] into a volume at its own position and size.
    pub fn get_voxels_into(&self, volume: &mut VoxelsVolume, backlight: bool, top: i32) {
        let pos = volume.position();
        let size = volume.size();
        self.get_voxels(
            &mut volume.voxels,
            &mut volume.lights,
            pos,
            size,
            backlight,
            top,
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chunk::Chunk;
    use crate::light::CHANNEL_SUN;
    use crate::registry::BlockDef;
    use crate::voxel::BlockState;

    fn registry_with_stone() -> (Arc<BlockRegistry>, BlockId) {
        let mut registry = BlockRegistry::new();
        let stone = registry
            .register(BlockDef {
                name: "stone".to_string(),
                ..BlockDef::default()
            })
            .unwrap();
        (Arc::new(registry), stone)
    }

    #[test]
    fn test_new_volume_is_void() {
        let volume = VoxelsVolume::with_position(5, 6, 7, 2, 3, 4);
        assert!(volume.voxels().iter().all(|v| *v == Voxel::VOID));
        assert_eq!(volume.pick_block(5, 6, 7), Voxel::VOID);
        assert_eq!(volume.pick_block_id(100, 0, 0), BlockId::VOID);
        assert_eq!(volume.pick_light(100, 0, 0), Light::DARK);
    }

    #[test]
    fn test_missing_chunks_fill_void() {
        let (registry, stone) = registry_with_stone();
        let mut store = ChunkStore::new(4, 4, 0, 0, registry);
        let mut chunk = Chunk::new(0, 0);
        chunk.fill_layers(0, 4, stone);
        chunk.lightmap.set_sun(0, 4, 0, 15);
        assert!(store.put_chunk(Arc::new(chunk)));

        // Straddles chunk (0, 0) and the missing chunk (-1, 0).
        let mut volume = VoxelsVolume::with_position(-2, 2, 0, 4, 4, 2);
        store.get_voxels_into(&mut volume, false, CHUNK_H);

        assert_eq!(volume.pick_block_id(-2, 3, 0), BlockId::VOID);
        assert_eq!(volume.pick_block_id(-1, 5, 1), BlockId::VOID);
        assert_eq!(volume.pick_block_id(0, 3, 0), stone);
        assert_eq!(volume.pick_block_id(1, 4, 1), BlockId::AIR);
        assert_eq!(volume.pick_light(0, 4, 0).sun(), 15);
    }

    #[test]
    fn test_rows_above_top_untouched_and_out_of_column_void() {
        let (registry, _) = registry_with_stone();
        let mut store = ChunkStore::new(2, 2, 0, 0, registry);
        assert!(store.put_chunk(Arc::new(Chunk::new(0, 0))));

        let mut volume = VoxelsVolume::with_position(0, -2, 0, 1, 6, 1);
        volume.voxels_mut().fill(Voxel::new(BlockId(7), BlockState::default()));
        store.get_voxels_into(&mut volume, false, 4);

        assert_eq!(volume.pick_block_id(0, -2, 0), BlockId::VOID);
        assert_eq!(volume.pick_block_id(0, 1, 0), BlockId::AIR);
        assert_eq!(volume.pick_block_id(0, 2, 0), BlockId(7));
        assert_eq!(volume.pick_block_id(0, 3, 0), BlockId(7));
    }

    #[test]
    fn test_backlight_raises_colors_of_passing_cells() {
        let (registry, stone) = registry_with_stone();
        let mut store = ChunkStore::new(2, 2, 0, 0, registry);
        let mut chunk = Chunk::new(0, 0);
        chunk.fill_layers(0, 1, stone);
        chunk.lightmap.set(0, 0, 0, Light::combine(3, 15, 0, 9));
        chunk.lightmap.set(0, 1, 0, Light::combine(3, 15, 0, 9));
        assert!(store.put_chunk(Arc::new(chunk)));

        let mut volume = VoxelsVolume::new(1, 2, 1);
        store.get_voxels_into(&mut volume, true, CHUNK_H);
        assert_eq!(volume.pick_light(0, 0, 0), Light::combine(3, 15, 0, 9));
        assert_eq!(volume.pick_light(0, 1, 0), Light::combine(4, 15, 1, 9));
        assert_eq!(volume.pick_light(0, 1, 0).extract(CHANNEL_SUN), 9);
    }

    #[test]
    fn test_compress_last_solid_wins() {
        let mut registry = BlockRegistry::new();
        let stone = registry
            .register(BlockDef {
                name: "stone".to_string(),
                ..BlockDef::default()
            })
            .unwrap();
        let dirt = registry
            .register(BlockDef {
                name: "dirt".to_string(),
                ..BlockDef::default()
            })
            .unwrap();

        let mut src = VoxelsVolume::new(2, 2, 2);
        src.voxels_mut().fill(Voxel::AIR);
        // Scan order is y, z, x: (0,0,0) comes before (1,1,1).
        src.voxels[vox_index(0, 0, 0, 2, 2)] = Voxel::new(stone, BlockState::default());
        src.voxels[vox_index(1, 1, 1, 2, 2)] = Voxel::new(dirt, BlockState::default());

        let mut dst = VoxelsVolume::new(1, 1, 1);
        src.compress_into(&mut dst, &registry);
        assert_eq!(dst.voxels()[0].id, dirt);
        assert_eq!(dst.lights()[0], Light::DARK);
    }

    #[test]
    fn test_compress_takes_first_light_and_skips_void() {
        let registry = BlockRegistry::new();
        let mut src = VoxelsVolume::new(2, 1, 2);
        src.voxels_mut().fill(Voxel::AIR);
        src.voxels[vox_index(0, 0, 0, 2, 2)] = Voxel::VOID;
        src.lights[vox_index(0, 0, 0, 2, 2)] = Light::combine(9, 0, 0, 0);
        src.lights[vox_index(0, 0, 1, 2, 2)] = Light::combine(5, 0, 0, 0);
        src.lights[vox_index(1, 0, 1, 2, 2)] = Light::combine(7, 0, 0, 0);

        let mut dst = VoxelsVolume::new(1, 1, 1);
        src.compress_into(&mut dst, &registry);
        assert_eq!(dst.voxels()[0], Voxel::AIR);
        assert_eq!(dst.lights()[0].red(), 5);
    }

    #[test]
    #[should_panic(expected = "divide")]
    fn test_compress_rejects_uneven_steps() {
        let registry = BlockRegistry::new();
        let src = VoxelsVolume::new(3, 2, 2);
        let mut dst = VoxelsVolume::new(2, 1, 1);
        src.compress_into(&mut dst, &registry);
    }
}
