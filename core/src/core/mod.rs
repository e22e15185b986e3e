//! Store combining the file layout, record codec and image sanitizer.

use crate::core::codec::error::CodecError;
use crate::core::file_storage::FileStorage;
use crate::core::resolver::{DirScanResolver, Resolver};
use crate::core::sanitizer::Sanitizer;
use crate::core::sink::ErrorSink;
use crate::types::{
    Config, ImageRecord, ItemFileName, ItemId, ItemKind, PasteRecord, StoredImage, Syntax,
};
use error::StoreError;
use image::ImageFormat;
use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub mod codec;
pub(crate) mod file_storage;
pub mod reaper;
pub mod resolver;
pub mod sanitizer;
pub mod sink;

pub mod error {
    use super::*;
    use crate::core::sanitizer::error::SanitizeError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum StoreError {
        #[error("Item not found: {}", .0.display())]
        NotFound(PathBuf),

        #[error("Corrupt record {}: {source}", path.display())]
        CorruptRecord {
            path: PathBuf,
            #[source]
            source: CodecError,
        },

        #[error("Invalid mime type: {0}")]
        InvalidMimeType(String),

        #[error("Sanitize error: {0}")]
        Sanitize(#[from] SanitizeError),

        #[error("Encode error: {0}")]
        Encode(#[from] CodecError),

        #[error("No content")]
        NoContent,

        #[error("Identifier {id} matches {count} files")]
        AmbiguousIdentifier { id: ItemId, count: usize },

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
    }
}

/// Mime type reported for content that is not recognizable as any image.
const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

pub struct Store {
    files: FileStorage,
    resolver: Box<dyn Resolver>,
    sanitizer: Sanitizer,
    sink: Arc<dyn ErrorSink>,
}

impl Store {
    /// Opens the store, creating the data directory if needed.
    pub fn open(config: &Config, sink: Arc<dyn ErrorSink>) -> Result<Self, StoreError> {
        let files = FileStorage::new(&config.data_dir);
        files.ensure_dir()?;

        Ok(Self {
            resolver: Box::new(DirScanResolver::new(&config.data_dir)),
            files,
            sanitizer: Sanitizer::new(config.image_bounds),
            sink,
        })
    }

    /// Replaces the directory-scan lookup.
    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.files.data_dir
    }

    pub(crate) fn files(&self) -> &FileStorage {
        &self.files
    }

    /// Resolves an album entry to its image file.
    ///
    /// Returns `None` for entries whose file name is not a bare image name, so a
    /// crafted album can never point outside the data directory.
    pub(crate) fn image_path(&self, record: &ImageRecord) -> Option<PathBuf> {
        let name = ItemFileName::parse(&record.file_name)?;
        (name.kind == ItemKind::Image).then(|| self.files.path_for(&name))
    }
}

/// Write operations.
impl Store {
    /// Persists a plain paste. Empty content is accepted.
    pub fn write_plain(
        &self,
        source_address: Option<&str>,
        content: &[u8],
        expiration_secs: u64,
        syntax: Option<Syntax>,
    ) -> Result<ItemId, StoreError> {
        let record = PasteRecord {
            id: ItemId::generate(),
            source_address: source_address.map(str::to_string),
            syntax,
            expiration_secs,
            raw_content: content.to_vec(),
        };
        let bytes = codec::encode_plain(&record)?;

        let path = self
            .files
            .write_new(&ItemFileName::plain(record.id, expiration_secs), &bytes)?;
        debug!(id = %record.id, path = %path.display(), "wrote paste");
        Ok(record.id)
    }

    /// Persists one image and returns its metadata.
    ///
    /// The mime type is sniffed from content; PNG and JPEG are sanitized
    /// before being written. An expiring image also gets a metadata sidecar
    /// carrying its expiration for the reaper.
    pub fn write_image(
        &self,
        source_address: Option<&str>,
        content: &[u8],
        expiration_secs: u64,
    ) -> Result<ImageRecord, StoreError> {
        let record = self.store_image(source_address, content, expiration_secs)?;
        if expiration_secs == 0 {
            return Ok(record);
        }

        let written = codec::encode_image_meta(&record)
            .map_err(StoreError::from)
            .and_then(|meta| {
                let name = ItemFileName::image_meta(record.id);
                self.files.write_new(&name, &meta).map_err(StoreError::from)
            });
        if let Err(e) = written {
            if let Err(cleanup) = self.files.remove_if_exists(&record.file_path) {
                warn!(id = %record.id, error = %cleanup, "could not remove image after failed sidecar write");
            }
            return Err(e);
        }
        debug!(id = %record.id, "wrote image sidecar");
        Ok(record)
    }

    /// Writes the image file alone. Album images use this directly since the
    /// album records their expiration.
    fn store_image(
        &self,
        source_address: Option<&str>,
        content: &[u8],
        expiration_secs: u64,
    ) -> Result<ImageRecord, StoreError> {
        let format = image::guess_format(content)
            .map_err(|_| StoreError::InvalidMimeType(UNKNOWN_MIME_TYPE.to_string()))?;
        let mime_type = format.to_mime_type();
        if !mime_type.starts_with("image/") {
            return Err(StoreError::InvalidMimeType(mime_type.to_string()));
        }
        let extension = *format
            .extensions_str()
            .first()
            .ok_or_else(|| StoreError::InvalidMimeType(mime_type.to_string()))?;

        let bytes = match format {
            ImageFormat::Png | ImageFormat::Jpeg => {
                Cow::Owned(self.sanitizer.sanitize(content, extension)?)
            }
            _ => Cow::Borrowed(content),
        };

        let id = ItemId::generate();
        let name = ItemFileName::image(id, expiration_secs, extension);
        let path = self.files.write_new(&name, &bytes)?;
        debug!(id = %id, path = %path.display(), mime_type, "wrote image");

        Ok(ImageRecord {
            expiration_secs,
            file_name: name.render(),
            file_path: path,
            source_address: source_address.map(str::to_string),
            mime_type: mime_type.to_string(),
            id,
        })
    }

    /// Persists every image that passes validation, then the album referencing them.
    ///
    /// A rejected image is logged and left out; the album fails with
    /// [`StoreError::NoContent`] only if no image survives.
    pub fn write_album<I>(
        &self,
        source_address: Option<&str>,
        images: I,
        expiration_secs: u64,
    ) -> Result<ItemId, StoreError>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut records = Vec::new();
        for (index, image) in images.into_iter().enumerate() {
            match self.store_image(source_address, image.as_ref(), expiration_secs) {
                Ok(record) => records.push(record),
                Err(e) => warn!(index, error = %e, "skipping album image"),
            }
        }

        if records.is_empty() {
            return Err(StoreError::NoContent);
        }

        let id = ItemId::generate();
        let bytes = codec::encode_album(&records)?;
        let path = self
            .files
            .write_new(&ItemFileName::album(id, expiration_secs), &bytes)?;
        debug!(id = %id, path = %path.display(), images = records.len(), "wrote album");
        Ok(id)
    }
}

/// Read operations.
impl Store {
    pub fn find_by_identifier(&self, id: &ItemId) -> Result<Option<PathBuf>, StoreError> {
        self.resolver.resolve(id)
    }

    pub fn read_plain(&self, path: &Path) -> Result<PasteRecord, StoreError> {
        let bytes = self.read_file(path)?;
        codec::decode_plain(&bytes).map_err(|source| StoreError::CorruptRecord {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads an album. Entries referring to anything but a bare image file name
    /// make the whole record corrupt.
    pub fn read_album(&self, path: &Path) -> Result<Vec<ImageRecord>, StoreError> {
        let bytes = self.read_file(path)?;
        let corrupt = |source| StoreError::CorruptRecord {
            path: path.to_path_buf(),
            source,
        };

        let records = codec::decode_album(&bytes).map_err(corrupt)?;
        if let Some(bad) = records.iter().find(|r| self.image_path(r).is_none()) {
            return Err(corrupt(CodecError::InvalidReference(bad.file_name.clone())));
        }
        Ok(records)
    }

    /// Reads a standalone image's sidecar. The record must name an image file
    /// of the same item.
    pub(crate) fn read_image_meta(&self, path: &Path) -> Result<ImageRecord, StoreError> {
        let bytes = self.read_file(path)?;
        let corrupt = |source| StoreError::CorruptRecord {
            path: path.to_path_buf(),
            source,
        };

        let record = codec::decode_image_meta(&bytes).map_err(corrupt)?;
        let owner = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(ItemFileName::parse)
            .map(|name| name.id);
        if owner != Some(record.id) || self.image_path(&record).is_none() {
            return Err(corrupt(CodecError::InvalidReference(record.file_name)));
        }
        Ok(record)
    }

    pub fn read_image_bytes(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        self.read_file(path)
    }

    pub fn read_plain_by_identifier(&self, id: &ItemId) -> Result<Option<PasteRecord>, StoreError> {
        let Some(path) = self.find_kind(id, ItemKind::Plain)? else {
            return Ok(None);
        };
        self.recover(self.read_plain(&path))
    }

    pub fn read_album_by_identifier(
        &self,
        id: &ItemId,
    ) -> Result<Option<Vec<ImageRecord>>, StoreError> {
        let Some(path) = self.find_kind(id, ItemKind::Album)? else {
            return Ok(None);
        };
        self.recover(self.read_album(&path))
    }

    pub fn read_image_by_identifier(&self, id: &ItemId) -> Result<Option<StoredImage>, StoreError> {
        let Some(path) = self.find_kind(id, ItemKind::Image)? else {
            return Ok(None);
        };
        let Some(bytes) = self.recover(self.read_image_bytes(&path))? else {
            return Ok(None);
        };

        let mime_type = image::guess_format(&bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or(UNKNOWN_MIME_TYPE);
        Ok(Some(StoredImage {
            mime_type: mime_type.to_string(),
            bytes,
        }))
    }

    fn find_kind(&self, id: &ItemId, kind: ItemKind) -> Result<Option<PathBuf>, StoreError> {
        let Some(path) = self.find_by_identifier(id)? else {
            return Ok(None);
        };
        let found = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(ItemFileName::parse)
            .map(|name| name.kind);
        if found != Some(kind) {
            debug!(id = %id, ?kind, ?found, "identifier belongs to another item kind");
            return Ok(None);
        }
        Ok(Some(path))
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        self.files.read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(path.to_path_buf()),
            _ => StoreError::Io(e),
        })
    }

    /// Folds misses and corruption into `None`; corruption is reported to the sink.
    fn recover<T>(&self, result: Result<T, StoreError>) -> Result<Option<T>, StoreError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e @ StoreError::CorruptRecord { .. }) => {
                self.sink.report("unreadable record", &e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests;
