//! Four-channel lighting built from per-channel [`LightSolver`]s: sky light
//! for freshly generated chunks, emitter seeding on load, and the incremental
//! update after a single block change.

use std::sync::Arc;

use tracing::debug;
use umbra_voxel::{
    BlockId, BlockRegistry, CHANNEL_SUN, CHUNK_D, CHUNK_H, CHUNK_W, Chunk, ChunkStore, LIGHTED,
    LIGHT_CHANNELS, Light,
};

use crate::solver::LightSolver;

const NEIGHBORS_6: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// Owns one solver per channel: red, green, blue and sun.
#[derive(Debug)]
pub struct Lighting {
    solvers: [LightSolver; LIGHT_CHANNELS],
}

impl Lighting {
    pub fn new() -> Self {
        Self {
            solvers: std::array::from_fn(LightSolver::new),
        }
    }

    /// Solver for one channel.
    pub fn solver(&mut self, channel: usize) -> &mut LightSolver {
        &mut self.solvers[channel]
    }

    /// Lights every column of `chunk` from the top down to its first
    /// sky-blocking block and records the highest blocking row.
    ///
    /// Runs on a chunk before it enters the store.
    pub fn prebuild_sky_light(chunk: &mut Chunk, registry: &BlockRegistry) {
        let mut highest = 0;
        for z in 0..CHUNK_D {
            for x in 0..CHUNK_W {
                for y in (0..CHUNK_H).rev() {
                    let id = chunk.voxel(x, y, z).id;
                    if !registry.try_get(id).is_some_and(|def| def.sky_light_passing) {
                        highest = highest.max(y);
                        break;
                    }
                    chunk.lightmap.set_sun(x, y, z, Light::MAX_LEVEL);
                }
            }
        }
        chunk.lightmap.highest_point = (highest + 1).min(CHUNK_H - 1);
    }

    /// Spreads prebuilt sky light sideways into overhangs and neighbours.
    pub fn build_sky_light(&mut self, store: &mut ChunkStore, cx: i32, cz: i32) {
        let seeds = {
            let Some(chunk) = store.chunk(cx, cz) else {
                return;
            };
            let registry = store.registry();
            let mut seeds = Vec::new();
            for z in 0..CHUNK_D {
                for x in 0..CHUNK_W {
                    for y in (0..=chunk.lightmap.highest_point).rev() {
                        let id = chunk.voxel(x, y, z).id;
                        if !registry.try_get(id).is_some_and(|def| def.sky_light_passing) {
                            break;
                        }
                        seeds.push((cx * CHUNK_W + x, y, cz * CHUNK_D + z));
                    }
                }
            }
            seeds
        };
        let sun = &mut self.solvers[CHANNEL_SUN];
        for (x, y, z) in seeds {
            sun.add_existing(store, x, y, z);
        }
        sun.solve(store);
        if let Some(chunk) = store.chunk_mut(cx, cz) {
            chunk.mark_dirty(LIGHTED);
        }
    }

    /// Seeds every emissive block of a newly resident chunk and solves.
    ///
    /// With `expand`, border cells on both sides of each chunk seam are
    /// re-seeded with their current light so light flows across it.
    pub fn on_chunk_loaded(&mut self, store: &mut ChunkStore, cx: i32, cz: i32, expand: bool) {
        let (ox, oz) = (cx * CHUNK_W, cz * CHUNK_D);
        let emitters = {
            let Some(chunk) = store.chunk(cx, cz) else {
                return;
            };
            let registry = store.registry();
            let mut emitters = Vec::new();
            for y in chunk.bottom()..chunk.top() {
                for z in 0..CHUNK_D {
                    for x in 0..CHUNK_W {
                        if let Some(def) = registry.try_get(chunk.voxel(x, y, z).id)
                            && def.is_emissive()
                        {
                            emitters.push((ox + x, y, oz + z, def.emission));
                        }
                    }
                }
            }
            emitters
        };
        let count = emitters.len();
        for (x, y, z, emission) in emitters {
            for (channel, level) in emission.into_iter().enumerate() {
                self.solvers[channel].add(store, x, y, z, level);
            }
        }

        if expand {
            for y in 0..CHUNK_H {
                for z in 0..CHUNK_D {
                    for x in [0, CHUNK_W - 1] {
                        let outside = if x == 0 { -1 } else { CHUNK_W };
                        self.seed_existing(store, ox + x, y, oz + z);
                        self.seed_existing(store, ox + outside, y, oz + z);
                    }
                }
                for x in 0..CHUNK_W {
                    for z in [0, CHUNK_D - 1] {
                        let outside = if z == 0 { -1 } else { CHUNK_D };
                        self.seed_existing(store, ox + x, y, oz + z);
                        self.seed_existing(store, ox + x, y, oz + outside);
                    }
                }
            }
        }

        self.solve(store);
        debug!(cx, cz, emitters = count, expand, "chunk lighting built");
    }

    /// Updates lighting after the block at `(x, y, z)` became `id`.
    pub fn on_block_set(&mut self, store: &mut ChunkStore, x: i32, y: i32, z: i32, id: BlockId) {
        let registry = Arc::clone(store.registry());
        let Some(def) = registry.try_get(id) else {
            return;
        };

        for solver in &mut self.solvers[..CHANNEL_SUN] {
            solver.remove(store, x, y, z);
        }
        if !def.sky_light_passing {
            let sun = &mut self.solvers[CHANNEL_SUN];
            sun.remove(store, x, y, z);
            for below in (0..y).rev() {
                let passing = store
                    .get(x, below, z)
                    .and_then(|voxel| registry.try_get(voxel.id))
                    .is_some_and(|below_def| below_def.sky_light_passing);
                if !passing {
                    break;
                }
                sun.remove(store, x, below, z);
            }
        }
        self.solve(store);

        if def.light_passing {
            for (dx, dy, dz) in NEIGHBORS_6 {
                self.seed_existing(store, x + dx, y + dy, z + dz);
            }
            let open_above = y + 1 >= CHUNK_H
                || store.light_channel(x, y + 1, z, CHANNEL_SUN) == Light::MAX_LEVEL;
            if def.sky_light_passing && open_above {
                let sun = &mut self.solvers[CHANNEL_SUN];
                for below in (0..=y).rev() {
                    let passing = store
                        .get(x, below, z)
                        .and_then(|voxel| registry.try_get(voxel.id))
                        .is_some_and(|below_def| below_def.sky_light_passing);
                    if !passing {
                        break;
                    }
                    sun.add(store, x, below, z, Light::MAX_LEVEL);
                }
            }
        }
        if def.is_emissive() {
            for (channel, &level) in def.emission.iter().enumerate() {
                self.solvers[channel].add(store, x, y, z, level);
            }
        }
        self.solve(store);
    }

    /// Zeroes the light buffer of every resident chunk and drops queued work.
    pub fn clear(&mut self, store: &mut ChunkStore) {
        for solver in &mut self.solvers {
            solver.reset();
        }
        let positions: Vec<(i32, i32)> = store.iter().map(|chunk| (chunk.x, chunk.z)).collect();
        for (cx, cz) in positions {
            if let Some(chunk) = store.chunk_mut(cx, cz) {
                chunk.lightmap.clear();
                chunk.clear_dirty(LIGHTED);
            }
        }
    }

    /// Drains every channel's queues.
    pub fn solve(&mut self, store: &mut ChunkStore) {
        for solver in &mut self.solvers {
            solver.solve(store);
        }
    }

    fn seed_existing(&mut self, store: &mut ChunkStore, x: i32, y: i32, z: i32) {
        for solver in &mut self.solvers {
            solver.add_existing(store, x, y, z);
        }
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
