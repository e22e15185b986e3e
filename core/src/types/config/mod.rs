mod app;
mod core;

pub use app::{AppConfig, AppConfigError, ImagesConfig, ReaperConfig, StorageConfig};
pub use core::{Config, ImageBounds};
