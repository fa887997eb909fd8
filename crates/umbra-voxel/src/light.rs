//! Four-channel packed light values and the per-chunk light buffer.
//!
//! Each cell stores red, green, blue, and sun light at 4 bits per channel in a
//! single `u16`: red in bits 0–3, green 4–7, blue 8–11, sun 12–15.

use serde::{Deserialize, Serialize};

use crate::chunk::{CHUNK_D, CHUNK_H, CHUNK_VOLUME, CHUNK_W, vox_index};

/// Channel index of red light.
pub const CHANNEL_RED: usize = 0;
/// Channel index of green light.
pub const CHANNEL_GREEN: usize = 1;
/// Channel index of blue light.
pub const CHANNEL_BLUE: usize = 2;
/// Channel index of sunlight.
pub const CHANNEL_SUN: usize = 3;
/// Number of independently propagated channels.
pub const LIGHT_CHANNELS: usize = 4;

/// Packed four-channel light level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Light(pub u16);

impl Light {
    /// Maximum level of any channel.
    pub const MAX_LEVEL: u8 = 15;
    /// No light in any channel.
    pub const DARK: Light = Light(0);
    /// Full sunlight, no colored light.
    pub const SUN_ONLY: Light = Light(0xF000);

    /// Packs four channel levels (each 0–15).
    pub fn combine(r: u8, g: u8, b: u8, s: u8) -> Self {
        debug_assert!(r <= 15 && g <= 15 && b <= 15 && s <= 15);
        Self(
            u16::from(r & 0xF)
                | (u16::from(g & 0xF) << 4)
                | (u16::from(b & 0xF) << 8)
                | (u16::from(s & 0xF) << 12),
        )
    }

    /// Level of `channel` (0–15).
    #[inline]
    pub fn extract(self, channel: usize) -> u8 {
        debug_assert!(channel < LIGHT_CHANNELS);
        ((self.0 >> (channel << 2)) & 0xF) as u8
    }

    /// Returns a copy with `channel` replaced by `level`.
    #[inline]
    pub fn with_channel(self, channel: usize, level: u8) -> Self {
        debug_assert!(channel < LIGHT_CHANNELS);
        debug_assert!(level <= Self::MAX_LEVEL);
        let shift = channel << 2;
        Self((self.0 & !(0xF << shift)) | (u16::from(level & 0xF) << shift))
    }

    pub fn red(self) -> u8 {
        self.extract(CHANNEL_RED)
    }

    pub fn green(self) -> u8 {
        self.extract(CHANNEL_GREEN)
    }

    pub fn blue(self) -> u8 {
        self.extract(CHANNEL_BLUE)
    }

    pub fn sun(self) -> u8 {
        self.extract(CHANNEL_SUN)
    }
}

/// Per-cell light buffer parallel to a chunk's voxel array.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lightmap {
    lights: Box<[Light]>,
    /// First row (from the top) that sky-light building must scan.
    pub highest_point: i32,
}

impl Lightmap {
    /// Creates a fully dark light map.
    pub fn new_dark() -> Self {
        Self {
            lights: vec![Light::DARK; CHUNK_VOLUME].into_boxed_slice(),
            highest_point: 0,
        }
    }

    /// Packed light at chunk-local `(x, y, z)`.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> Light {
        self.lights[Self::index(x, y, z)]
    }

    /// Single channel at chunk-local `(x, y, z)`.
    #[inline]
    pub fn get_channel(&self, x: i32, y: i32, z: i32, channel: usize) -> u8 {
        self.get(x, y, z).extract(channel)
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, z: i32, light: Light) {
        self.lights[Self::index(x, y, z)] = light;
    }

    #[inline]
    pub fn set_channel(&mut self, x: i32, y: i32, z: i32, channel: usize, level: u8) {
        let index = Self::index(x, y, z);
        self.lights[index] = self.lights[index].with_channel(channel, level);
    }

    /// Sun channel shortcut used by sky-light building.
    pub fn sun(&self, x: i32, y: i32, z: i32) -> u8 {
        self.get_channel(x, y, z, CHANNEL_SUN)
    }

    pub fn set_sun(&mut self, x: i32, y: i32, z: i32, level: u8) {
        self.set_channel(x, y, z, CHANNEL_SUN, level);
    }

    /// Resets every cell to dark.
    pub fn clear(&mut self) {
        self.lights.fill(Light::DARK);
    }

    /// Raw buffer in chunk voxel order.
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    fn index(x: i32, y: i32, z: i32) -> usize {
        debug_assert!((0..CHUNK_W).contains(&x));
        debug_assert!((0..CHUNK_H).contains(&y));
        debug_assert!((0..CHUNK_D).contains(&z));
        vox_index(x, y, z, CHUNK_W, CHUNK_D)
    }
}

impl Default for Lightmap {
    fn default() -> Self {
        Self::new_dark()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
