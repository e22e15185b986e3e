//! Byte framing for paste and album records.
//!
//! Paste file: compact JSON header, one `\n`, then the raw content verbatim.
//! Album file: a JSON array of [`ImageRecord`]s with no payload.
//! Image sidecar: one [`ImageRecord`] as a JSON object.
//! Image files have no framing and never pass through here.

use crate::types::{ImageRecord, ItemId, PasteRecord, Syntax};
use error::CodecError;
use serde::{Deserialize, Serialize};

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum CodecError {
        #[error("Missing header separator")]
        MissingSeparator,

        #[error("Malformed document: {0}")]
        Json(#[from] serde_json::Error),

        #[error("Album contains no images")]
        EmptyAlbum,

        #[error("Album entry refers to invalid file name {0:?}")]
        InvalidReference(String),
    }
}

pub const PLAIN_MIME_TYPE: &str = "text/plain";
const SEPARATOR: u8 = b'\n';

/// Fields are declared in sorted order so the header has sorted keys.
#[derive(Debug, Serialize, Deserialize)]
struct PasteHeader {
    #[serde(default)]
    expiration: u64,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default = "default_mime_type")]
    mimetype: String,
    #[serde(default)]
    syntax: Option<Syntax>,
    uid: ItemId,
}

fn default_mime_type() -> String {
    PLAIN_MIME_TYPE.to_string()
}

pub fn encode_plain(record: &PasteRecord) -> Result<Vec<u8>, CodecError> {
    let header = PasteHeader {
        expiration: record.expiration_secs,
        ip: record.source_address.clone(),
        mimetype: default_mime_type(),
        syntax: record.syntax.clone(),
        uid: record.id,
    };

    // Compact JSON escapes newlines inside strings, so the first `\n` is always the separator.
    let mut bytes = serde_json::to_vec(&header)?;
    bytes.reserve(1 + record.raw_content.len());
    bytes.push(SEPARATOR);
    bytes.extend_from_slice(&record.raw_content);
    Ok(bytes)
}

pub fn decode_plain(bytes: &[u8]) -> Result<PasteRecord, CodecError> {
    let split = bytes
        .iter()
        .position(|&b| b == SEPARATOR)
        .ok_or(CodecError::MissingSeparator)?;
    let (header, content) = (&bytes[..split], &bytes[split + 1..]);

    let header: PasteHeader = serde_json::from_slice(header)?;
    Ok(PasteRecord {
        id: header.uid,
        source_address: header.ip,
        syntax: header.syntax,
        expiration_secs: header.expiration,
        raw_content: content.to_vec(),
    })
}

/// Refuses to encode an empty album; an album must hold at least one image.
pub fn encode_album(records: &[ImageRecord]) -> Result<Vec<u8>, CodecError> {
    if records.is_empty() {
        return Err(CodecError::EmptyAlbum);
    }
    Ok(serde_json::to_vec(records)?)
}

pub fn decode_album(bytes: &[u8]) -> Result<Vec<ImageRecord>, CodecError> {
    let records: Vec<ImageRecord> = serde_json::from_slice(bytes)?;
    if records.is_empty() {
        return Err(CodecError::EmptyAlbum);
    }
    Ok(records)
}

pub fn encode_image_meta(record: &ImageRecord) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(record)?)
}

pub fn decode_image_meta(bytes: &[u8]) -> Result<ImageRecord, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}
