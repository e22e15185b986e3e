use std::path::PathBuf;
use std::time::Duration;

use crate::types::MAX_EXPIRATION_SECS;

/// Bounding box images are downsized to fit within.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageBounds {
    pub width: u32,
    pub height: u32,
}

impl ImageBounds {
    pub const DEFAULT: Self = Self {
        width: 3840,
        height: 2160,
    };

    /// The longer side of the box. Images whose longer side exceeds this get resized.
    pub fn longest_edge(&self) -> u32 {
        self.width.max(self.height)
    }
}

impl Default for ImageBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Core configuration for opening a [`Store`](crate::core::Store) and its [`Reaper`](crate::core::reaper::Reaper).
#[derive(Clone, Debug)]
pub struct Config {
    pub data_dir: PathBuf,
    /// Combined size of the data directory above which the reaper clears it.
    pub max_data_dir_bytes: u64,
    pub image_bounds: ImageBounds,
    /// Age after which an expiring image no album refers to is removed.
    pub orphan_image_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Config {
    pub const DEFAULT_MAX_DATA_DIR_BYTES: u64 = 1024 * 1024 * 1024;
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_data_dir_bytes: Self::DEFAULT_MAX_DATA_DIR_BYTES,
            image_bounds: ImageBounds::DEFAULT,
            orphan_image_ttl: Duration::from_secs(MAX_EXPIRATION_SECS),
            sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
        }
    }
}
