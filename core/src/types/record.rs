use crate::types::{ItemId, Syntax};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A plain-text paste, header plus raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteRecord {
    pub id: ItemId,
    pub source_address: Option<String>,
    pub syntax: Option<Syntax>,
    /// Lifetime in seconds; `0` never expires.
    pub expiration_secs: u64,
    /// Stored verbatim. Never re-encoded on write.
    pub raw_content: Vec<u8>,
}

impl PasteRecord {
    /// Content as text for display, dropping invalid UTF-8 sequences.
    pub fn content_lossy(&self) -> String {
        self.raw_content
            .utf8_chunks()
            .map(|chunk| chunk.valid())
            .collect()
    }
}

/// Metadata for one stored image.
///
/// Serialized field names are shared with album documents, and are declared in
/// sorted order so the JSON output has sorted keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(rename = "expiration", default)]
    pub expiration_secs: u64,
    #[serde(rename = "filename")]
    pub file_name: String,
    /// Absolute path at write time. Readers resolve by `file_name` against the
    /// data directory instead, so a moved data directory keeps working.
    #[serde(rename = "filepath")]
    pub file_path: PathBuf,
    #[serde(rename = "ip", default)]
    pub source_address: Option<String>,
    #[serde(rename = "mimetype")]
    pub mime_type: String,
    #[serde(rename = "uid")]
    pub id: ItemId,
}

/// Image bytes read back from the store, with the mime type sniffed from content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}
