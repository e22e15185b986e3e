use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::{Config, ImageBounds};
use crate::types::MAX_EXPIRATION_SECS;

/// Operator-facing configuration, persisted as config.toml.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub reaper: ReaperConfig,
}

impl AppConfig {
    /// Returns the config file path within the given directory.
    pub fn path(dir: &Path) -> PathBuf {
        dir.join("config.toml")
    }

    /// Loads config from a TOML file. Returns default config if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, AppConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), AppConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates config values and returns list of validation errors.
    /// Returns empty vec if config is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.storage.max_data_dir_bytes == 0 {
            errors.push("max_data_dir_bytes must be at least 1".to_string());
        }
        if self.storage.max_content_upload_bytes == 0 {
            errors.push("max_content_upload_bytes must be at least 1".to_string());
        }
        if self.images.max_width == 0 || self.images.max_height == 0 {
            errors.push("image bounds must be at least 1x1".to_string());
        }
        if self.reaper.interval_secs == 0 {
            errors.push("reaper interval_secs must be at least 1".to_string());
        }

        errors
    }

    /// Returns a validated config, replacing invalid values with defaults.
    pub fn with_defaults_for_invalid(&self) -> Self {
        let defaults = Self::default();
        let or_default = |value: u64, default: u64| if value == 0 { default } else { value };

        let images = if self.images.max_width == 0 || self.images.max_height == 0 {
            defaults.images.clone()
        } else {
            self.images.clone()
        };

        Self {
            storage: StorageConfig {
                data_dir: self.storage.data_dir.clone(),
                max_data_dir_bytes: or_default(
                    self.storage.max_data_dir_bytes,
                    defaults.storage.max_data_dir_bytes,
                ),
                max_content_upload_bytes: or_default(
                    self.storage.max_content_upload_bytes,
                    defaults.storage.max_content_upload_bytes,
                ),
            },
            images,
            reaper: ReaperConfig {
                interval_secs: or_default(self.reaper.interval_secs, defaults.reaper.interval_secs),
                orphan_image_ttl_secs: self.reaper.orphan_image_ttl_secs,
            },
        }
    }

    /// Builds the core config. A relative `data_dir` is resolved against `base_dir`.
    pub fn to_config(&self, base_dir: &Path) -> Config {
        Config {
            data_dir: base_dir.join(&self.storage.data_dir),
            max_data_dir_bytes: self.storage.max_data_dir_bytes,
            image_bounds: ImageBounds {
                width: self.images.max_width,
                height: self.images.max_height,
            },
            orphan_image_ttl: Duration::from_secs(self.reaper.orphan_image_ttl_secs),
            sweep_interval: Duration::from_secs(self.reaper.interval_secs),
        }
    }
}

/// Data directory and size limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_max_data_dir_bytes")]
    pub max_data_dir_bytes: u64,
    /// Largest request body the request layer should accept.
    #[serde(default = "default_max_content_upload_bytes")]
    pub max_content_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_data_dir_bytes: default_max_data_dir_bytes(),
            max_content_upload_bytes: default_max_content_upload_bytes(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_max_data_dir_bytes() -> u64 {
    Config::DEFAULT_MAX_DATA_DIR_BYTES
}

fn default_max_content_upload_bytes() -> u64 {
    20 * 1024 * 1024
}

/// Image sanitizing bounds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            max_height: default_max_height(),
        }
    }
}

fn default_max_width() -> u32 {
    ImageBounds::DEFAULT.width
}

fn default_max_height() -> u32 {
    ImageBounds::DEFAULT.height
}

/// Sweep scheduling.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReaperConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_orphan_image_ttl_secs")]
    pub orphan_image_ttl_secs: u64,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            orphan_image_ttl_secs: default_orphan_image_ttl_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    Config::DEFAULT_SWEEP_INTERVAL.as_secs()
}

fn default_orphan_image_ttl_secs() -> u64 {
    MAX_EXPIRATION_SECS
}

/// Errors that can occur when loading or saving config.
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
