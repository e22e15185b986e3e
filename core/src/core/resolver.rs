//! Identifier to path lookup.

use crate::core::error::StoreError;
use crate::types::{ItemFileName, ItemId, ItemKind};
use std::path::{Path, PathBuf};

/// Locates the file holding an item.
///
/// Callers only see this trait, so the directory scan can be replaced by a
/// real index without touching them.
pub trait Resolver: Send + Sync {
    /// Returns `Ok(None)` if no file carries the identifier.
    fn resolve(&self, id: &ItemId) -> Result<Option<PathBuf>, StoreError>;
}

/// Resolves identifiers by listing the data directory on every call.
pub struct DirScanResolver {
    data_dir: PathBuf,
}

impl DirScanResolver {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Resolver for DirScanResolver {
    fn resolve(&self, id: &ItemId) -> Result<Option<PathBuf>, StoreError> {
        let prefix = id.file_prefix();
        let mut matches = Vec::new();

        for entry in std::fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with(&prefix) {
                continue;
            }
            match ItemFileName::parse(name) {
                Some(parsed) if parsed.kind != ItemKind::ImageMeta => {}
                _ => continue,
            }
            if entry.file_type()?.is_file() {
                matches.push(entry.path());
            }
        }

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            count => Err(StoreError::AmbiguousIdentifier { id: *id, count }),
        }
    }
}
