//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use umbra_voxel::{CHUNK_D, CHUNK_W};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Largest accepted `world.chunk_radius`.
pub const MAX_CHUNK_RADIUS: u32 = 64;

/// Top-level world configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Resident window and extraction settings.
    pub world: WorldConfig,
    /// Light propagation settings.
    pub lighting: LightingConfig,
    /// Ray marching settings.
    pub raycast: RaycastConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Chunk window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Half-width of the resident window in chunks (the window is `2 * radius` square).
    pub chunk_radius: u32,
    /// Center chunk X coordinate.
    pub center_x: i32,
    /// Center chunk Z coordinate.
    pub center_z: i32,
    /// Brighten light-passing cells by one step in extracted volumes.
    pub backlight: bool,
}

impl WorldConfig {
    /// Block position at the middle of the center chunk.
    ///
    /// Saturates for centers that fail [`Config::validate`].
    pub fn center_block(&self) -> (i32, i32) {
        (
            self.center_x.saturating_mul(CHUNK_W).saturating_add(CHUNK_W / 2),
            self.center_z.saturating_mul(CHUNK_D).saturating_add(CHUNK_D / 2),
        )
    }
}

/// Lighting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingConfig {
    /// Compute the sun channel when chunks are loaded.
    pub sky_light: bool,
    /// Let light flow across the borders of newly loaded chunks.
    pub expand_on_load: bool,
}

/// Ray casting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RaycastConfig {
    /// Maximum march distance in blocks.
    pub max_distance: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_radius: 8,
            center_x: 0,
            center_z: 0,
            backlight: true,
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            sky_light: true,
            expand_on_load: true,
        }
    }
}

impl Default for RaycastConfig {
    fn default() -> Self {
        Self { max_distance: 32.0 }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for Umbra, if the platform has one.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("umbra"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Checks values that parse but cannot drive a world.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if !(1..=MAX_CHUNK_RADIUS).contains(&world.chunk_radius) {
            return Err(ConfigError::InvalidRadius {
                radius: world.chunk_radius,
                max: MAX_CHUNK_RADIUS,
            });
        }
        let fits = |chunk: i32, edge: i32| {
            chunk
                .checked_mul(edge)
                .and_then(|block| block.checked_add(edge))
                .is_some()
        };
        if !fits(world.center_x, CHUNK_W) || !fits(world.center_z, CHUNK_D) {
            return Err(ConfigError::CenterOutOfRange {
                x: world.center_x,
                z: world.center_z,
            });
        }
        let dist = self.raycast.max_distance;
        if !dist.is_finite() || dist <= 0.0 {
            return Err(ConfigError::InvalidDistance(dist));
        }
        Ok(())
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        log::debug!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Re-reads the file; returns `Some(new_config)` if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        new_config.validate()?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
