pub(crate) mod config;
pub use config::{
    AppConfig, AppConfigError, Config, ImageBounds, ImagesConfig, ReaperConfig, StorageConfig,
};

pub(crate) mod expiration;
pub use expiration::{MAX_EXPIRATION_SECS, MIN_EXPIRATION_SECS, sanitize_expiration};

pub(crate) mod file_name;
pub use file_name::{ItemFileName, ItemKind};

pub(crate) mod id;
pub use id::ItemId;

pub(crate) mod record;
pub use record::{ImageRecord, PasteRecord, StoredImage};

pub(crate) mod syntax;
pub use syntax::{DEFAULT_SYNTAX, Syntax};
