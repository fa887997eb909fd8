//! Runtime settings for the Umbra voxel world.
//!
//! Settings persist to disk as RON and can be overridden from the command
//! line. Missing sections and fields fall back to their defaults, so older
//! config files keep loading after new settings are added.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, LightingConfig, MAX_CHUNK_RADIUS, RaycastConfig, WorldConfig,
    default_config_dir,
};
pub use error::ConfigError;
