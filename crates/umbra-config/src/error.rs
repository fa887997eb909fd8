//! Errors raised while loading, validating or saving `config.ron`.

use std::io;

/// Why a configuration could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    ReadError(#[source] io::Error),

    #[error("cannot write config file: {0}")]
    WriteError(#[source] io::Error),

    /// The file is not valid RON for [`crate::Config`].
    #[error("malformed config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    #[error("cannot encode config: {0}")]
    SerializeError(#[source] ron::Error),

    /// The chunk window would be empty or too large to keep resident.
    #[error("chunk_radius {radius} is outside 1..={max}")]
    InvalidRadius { radius: u32, max: u32 },

    /// The center chunk's block coordinates overflow `i32`.
    #[error("center chunk ({x}, {z}) is out of range")]
    CenterOutOfRange { x: i32, z: i32 },

    /// Ray marching needs a finite, positive range.
    #[error("max_distance must be finite and positive, got {0}")]
    InvalidDistance(f32),
}
