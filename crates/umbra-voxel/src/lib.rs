//! Chunked voxel world storage: packed cell types, the block definition
//! table, fixed-size chunks, the sliding chunk window, world-coordinate block
//! access and dense volume extraction.

pub mod area_map;
mod blocks;
pub mod chunk;
pub mod chunk_store;
pub mod error;
pub mod light;
pub mod registry;
pub mod volume;
pub mod voxel;

pub use area_map::AreaMap;
pub use chunk::{CHUNK_D, CHUNK_H, CHUNK_VOLUME, CHUNK_W, Chunk, LIGHTED, MODIFIED, UNSAVED};
pub use chunk_store::{ChunkEvent, ChunkListener, ChunkStore};
pub use error::VoxelError;
pub use light::{
    CHANNEL_BLUE, CHANNEL_GREEN, CHANNEL_RED, CHANNEL_SUN, LIGHT_CHANNELS, Light, Lightmap,
};
pub use registry::{
    BlockDef, BlockRegistry, BlockRuntime, CoordSystem, RegistryError, RotationProfile,
    segment_bits,
};
pub use volume::VoxelsVolume;
pub use voxel::{BlockId, BlockState, Voxel};
