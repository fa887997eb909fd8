//! Command-line argument parsing for the Umbra demo.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Umbra command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "umbra", about = "Chunked voxel world with light propagation")]
pub struct CliArgs {
    /// Half-width of the resident chunk window.
    #[arg(long)]
    pub chunk_radius: Option<u32>,

    /// Center chunk X coordinate.
    #[arg(long, allow_hyphen_values = true)]
    pub center_x: Option<i32>,

    /// Center chunk Z coordinate.
    #[arg(long, allow_hyphen_values = true)]
    pub center_z: Option<i32>,

    /// Disable backlight in extracted volumes.
    #[arg(long)]
    pub no_backlight: bool,

    /// Maximum ray march distance in blocks.
    #[arg(long)]
    pub max_distance: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(radius) = args.chunk_radius {
            self.world.chunk_radius = radius;
        }
        if let Some(x) = args.center_x {
            self.world.center_x = x;
        }
        if let Some(z) = args.center_z {
            self.world.center_z = z;
        }
        if args.no_backlight {
            self.world.backlight = false;
        }
        if let Some(dist) = args.max_distance {
            self.raycast.max_distance = dist;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs::parse_from([
            "umbra",
            "--chunk-radius",
            "2",
            "--center-x",
            "-4",
            "--no-backlight",
        ]);
        config.apply_cli_overrides(&args);
        assert_eq!(config.world.chunk_radius, 2);
        assert_eq!(config.world.center_x, -4);
        assert!(!config.world.backlight);
        // Non-overridden fields retain defaults
        assert_eq!(config.world.center_z, 0);
        assert_eq!(config.raycast.max_distance, 32.0);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        let args = CliArgs {
            chunk_radius: None,
            center_x: None,
            center_z: None,
            no_backlight: false,
            max_distance: None,
            log_level: None,
            config: None,
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_config_dir_and_level() {
        let args = CliArgs::parse_from(["umbra", "--config", "/tmp/umbra", "--log-level", "debug"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/umbra")));
        let mut config = Config::default();
        config.apply_cli_overrides(&args);
        assert_eq!(config.debug.log_level, "debug");
    }
}
