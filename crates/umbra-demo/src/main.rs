//! Builds a small world, lights it, edits it and marches rays through it.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use glam::{IVec3, Vec3};
use rustc_hash::FxHashSet;
use tracing::{error, info, warn};
use umbra_config::{CliArgs, Config, default_config_dir};
use umbra_lighting::Lighting;
use umbra_math::Aabb;
use umbra_physics::{obstacle_at, ray_cast, ray_cast_to_obstacle};
use umbra_voxel::{
    BlockDef, BlockId, BlockRegistry, BlockState, CHANNEL_BLUE, CHANNEL_RED, CHANNEL_SUN, CHUNK_D, CHUNK_H,
    CHUNK_W, Chunk, ChunkEvent, ChunkStore, RegistryError, RotationProfile, VoxelsVolume,
};

/// Surface height of the generated terrain.
const GROUND: i32 = 40;

/// Block the terrain is filled with.
const GROUND_BLOCK: &str = "stone";

struct Blocks {
    stone: BlockId,
    lamp: BlockId,
    glass: BlockId,
    door: BlockId,
}

fn register_blocks(registry: &mut BlockRegistry) -> Result<Blocks, RegistryError> {
    let stone = registry.register(BlockDef {
        name: "stone".to_string(),
        ..BlockDef::default()
    })?;
    let lamp = registry.register(BlockDef {
        name: "lamp".to_string(),
        emission: [14, 10, 4],
        ..BlockDef::default()
    })?;
    let glass = registry.register(BlockDef {
        name: "glass".to_string(),
        light_passing: true,
        sky_light_passing: true,
        ..BlockDef::default()
    })?;
    let door = registry.register(BlockDef {
        name: "door".to_string(),
        solid: false,
        light_passing: true,
        rotation: RotationProfile::Pane,
        size: IVec3::new(1, 2, 1),
        hitboxes: vec![Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.1875))],
        ..BlockDef::default()
    })?;
    Ok(Blocks {
        stone,
        lamp,
        glass,
        door,
    })
}

/// Flat stone terrain with sky light already filled in.
fn generate_chunk(cx: i32, cz: i32, ground: BlockId, registry: &BlockRegistry) -> Chunk {
    let mut chunk = Chunk::new(cx, cz);
    chunk.fill_layers(0, GROUND, ground);
    Lighting::prebuild_sky_light(&mut chunk, registry);
    chunk
}

fn populate(store: &mut ChunkStore, lighting: &mut Lighting, config: &Config) {
    let registry = Arc::clone(store.registry());
    let Some(ground) = registry.lookup_by_name(GROUND_BLOCK) else {
        warn!("Ground block {GROUND_BLOCK:?} is not registered, world left empty");
        return;
    };
    let (ox, oz) = store.offset();
    let (w, d) = (store.width() as i32, store.depth() as i32);

    let mut loaded = Vec::new();
    for cz in oz..oz + d {
        for cx in ox..ox + w {
            let chunk = generate_chunk(cx, cz, ground, &registry);
            if store.put_chunk(Arc::new(chunk)) {
                loaded.push((cx, cz));
            }
        }
    }

    for &(cx, cz) in &loaded {
        if config.lighting.sky_light {
            lighting.build_sky_light(store, cx, cz);
        }
        lighting.on_chunk_loaded(store, cx, cz, config.lighting.expand_on_load);
    }
    info!(chunks = loaded.len(), "world populated");
}

fn place(store: &mut ChunkStore, lighting: &mut Lighting, at: IVec3, id: BlockId) {
    match store.set(at.x, at.y, at.z, id, BlockState::default()) {
        Ok(()) => lighting.on_block_set(store, at.x, at.y, at.z, id),
        Err(e) => warn!("Failed to place block at {at}: {e}"),
    }
}

fn demonstrate_lighting(store: &mut ChunkStore, lighting: &mut Lighting, blocks: &Blocks) {
    let lamp_pos = IVec3::new(4, GROUND, 4);
    place(store, lighting, lamp_pos, blocks.lamp);

    let sample = lamp_pos + IVec3::new(0, 0, 2);
    let light = store.light(sample.x, sample.y, sample.z);
    info!(
        "Lamp at {lamp_pos}: light two cells away r={} g={} b={} sun={}",
        light.red(),
        light.green(),
        light.blue(),
        light.sun()
    );

    // A stone roof over the lamp shades the cells beneath it.
    let roof = lamp_pos + IVec3::new(0, 3, 0);
    for dz in -1..=1 {
        for dx in -1..=1 {
            place(store, lighting, roof + IVec3::new(dx, 0, dz), blocks.stone);
        }
    }
    let shaded = lamp_pos + IVec3::Y;
    info!(
        "Under the roof: sun={} red={}",
        store.light_channel(shaded.x, shaded.y, shaded.z, CHANNEL_SUN),
        store.light_channel(shaded.x, shaded.y, shaded.z, CHANNEL_RED)
    );

    place(store, lighting, roof, blocks.glass);
    info!(
        "Glass in the roof lets the sun back in: sun={}",
        store.light_channel(shaded.x, shaded.y, shaded.z, CHANNEL_SUN)
    );

    place(store, lighting, lamp_pos, BlockId::AIR);
    info!(
        "Lamp removed: red={}",
        store.light_channel(sample.x, sample.y, sample.z, CHANNEL_RED)
    );

    // A blue flare that is not backed by any block.
    let flare = lamp_pos + IVec3::new(-2, 1, 0);
    let blue = lighting.solver(CHANNEL_BLUE);
    blue.add(store, flare.x, flare.y, flare.z, 15);
    blue.solve(store);
    info!(
        "Flare lit: blue two cells away={}",
        store.light_channel(flare.x + 2, flare.y, flare.z, CHANNEL_BLUE)
    );
    blue.remove(store, flare.x, flare.y, flare.z);
    blue.solve(store);
    info!(
        "Flare out: blue={}",
        store.light_channel(flare.x + 2, flare.y, flare.z, CHANNEL_BLUE)
    );
}

fn demonstrate_extended_blocks(store: &mut ChunkStore, lighting: &mut Lighting, blocks: &Blocks) {
    let origin = IVec3::new(-6, GROUND, 3);
    place(store, lighting, origin, blocks.door);
    let upper = store.get(origin.x, origin.y + 1, origin.z);
    info!(
        "Door placed at {origin}; upper half is segment: {}",
        upper.is_some_and(|voxel| voxel.state.is_segment())
    );

    // Userbits are free for game state; mark the door as locked.
    match store.require_mut(origin.x, origin.y, origin.z) {
        Ok(voxel) => voxel.state = voxel.state.with_userbits(1),
        Err(e) => warn!("Door vanished: {e}"),
    }

    store.set_rotation(origin.x, origin.y, origin.z, 1);
    if let Some(upper) = store.get(origin.x, origin.y + 1, origin.z) {
        info!("Door rotated, upper half rotation {}", upper.state.rotation());
    }

    let point = origin.as_vec3() + Vec3::new(0.5, 1.5, 0.05);
    match obstacle_at(store, point) {
        Some(hitbox) => {
            let world_box = hitbox.translated(origin.as_vec3());
            info!(
                "Point {point} is inside a {} hitbox spanning {}..{}",
                hitbox.size(),
                world_box.min,
                world_box.max
            );
        }
        None => info!("Point {point} is free"),
    }
}

fn demonstrate_volume_extraction(store: &ChunkStore, config: &Config) {
    let size = 2 * CHUNK_W;
    let mut volume = VoxelsVolume::with_position(-CHUNK_W, GROUND - 8, -CHUNK_D, size, 16, size);
    store.get_voxels_into(&mut volume, config.world.backlight, CHUNK_H);

    let void = volume.voxels().iter().filter(|voxel| voxel.id.is_void()).count();
    let air = volume
        .voxels()
        .iter()
        .filter(|voxel| voxel.id == BlockId::AIR)
        .count();
    info!(
        "Extracted {}x{}x{} volume at {}: {air} air, {void} void",
        volume.w(),
        volume.h(),
        volume.d(),
        volume.position()
    );

    let mut lod = VoxelsVolume::new(size / 4, 4, size / 4);
    volume.compress_into(&mut lod, store.registry());
    let solid = lod
        .voxels()
        .iter()
        .filter(|voxel| voxel.id != BlockId::AIR)
        .count();
    info!("Downsampled to {}x{}x{}: {solid} solid cells", lod.w(), lod.h(), lod.d());
}

fn demonstrate_ray_casts(store: &ChunkStore, config: &Config) {
    let max_dist = config.raycast.max_distance;
    let eye = Vec3::new(0.5, GROUND as f32 + 6.5, 0.5);

    let down = Vec3::new(0.3, -1.0, 0.2).normalize();
    let end = ray_cast_to_obstacle(store, eye, down, max_dist);
    info!("Ray from {eye} down stopped at {end}");

    let up = ray_cast_to_obstacle(store, eye, Vec3::Y, max_dist);
    info!("Ray from {eye} up travelled {:.1} blocks", (up - eye).length());

    let result = ray_cast(store, eye, down, max_dist, &FxHashSet::default());
    match result.hit {
        Some(hit) => info!(
            "Picked block {:?} at {} (face normal {})",
            hit.voxel.id, hit.position, hit.normal
        ),
        None => info!("Nothing picked, ray ended at {}", result.end),
    }
}

fn demonstrate_recentering(store: &mut ChunkStore, config: &Config) {
    let (x, z) = config.world.center_block();
    let (x, z) = (x + 2 * CHUNK_W, z);
    store.set_center(x, z);
    info!(
        "Window recentered on block ({x}, {z}): {} chunks resident, offset {:?}",
        store.len(),
        store.offset()
    );
}

fn main() {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from("umbra"));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);
    if let Err(e) = config.validate() {
        eprintln!("Invalid settings: {e}, using defaults");
        config = Config::default();
    }

    let log_dir = config_dir.join("logs");
    umbra_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let mut registry = BlockRegistry::new();
    let blocks = match register_blocks(&mut registry) {
        Ok(blocks) => blocks,
        Err(e) => {
            error!("Failed to register blocks: {e}");
            return;
        }
    };
    info!("Registered {} block types", registry.len());

    let (center_x, center_z) = config.world.center_block();
    let mut store = ChunkStore::new(1, 1, 0, 0, Arc::new(registry));
    store.add_listener(Box::new(|event: ChunkEvent, chunk: &Arc<Chunk>| {
        if event == ChunkEvent::Hidden {
            tracing::debug!(cx = chunk.x, cz = chunk.z, "chunk left the window");
        }
    }));

    store.configure(center_x, center_z, config.world.chunk_radius);

    let mut lighting = Lighting::new();
    populate(&mut store, &mut lighting, &config);

    demonstrate_lighting(&mut store, &mut lighting, &blocks);
    demonstrate_extended_blocks(&mut store, &mut lighting, &blocks);
    demonstrate_volume_extraction(&store, &config);
    demonstrate_ray_casts(&store, &config);
    demonstrate_recentering(&mut store, &config);

    info!("Umbra demo finished");
}
