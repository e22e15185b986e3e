//! File naming convention for items in the flat data directory.
//!
//! - `<id>.paste` / `<id>.expires.paste` for plain pastes
//! - `<id>.album` / `<id>.expires.album` for albums
//! - `<id>.<ext>` / `<id>.expires.<ext>` for images
//! - `<id>.expires.meta` next to a standalone expiring image, holding its
//!   metadata so the reaper knows its expiration
//!
//! The `expires.` infix marks an item as a cleanup candidate and is present
//! iff the item's expiration is non-zero.

use crate::types::ItemId;

const EXPIRES_INFIX: &str = "expires.";
const PASTE_SUFFIX: &str = "paste";
const ALBUM_SUFFIX: &str = "album";
const META_SUFFIX: &str = "meta";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Plain,
    Image,
    Album,
    /// Bookkeeping for a standalone image. Never returned by lookup.
    ImageMeta,
}

/// A parsed item file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFileName {
    pub id: ItemId,
    pub expires: bool,
    pub kind: ItemKind,
    /// Final suffix: `paste`, `album`, or the image extension.
    pub extension: String,
}

impl ItemFileName {
    pub fn plain(id: ItemId, expiration_secs: u64) -> Self {
        Self::new(id, expiration_secs, ItemKind::Plain, PASTE_SUFFIX)
    }

    pub fn album(id: ItemId, expiration_secs: u64) -> Self {
        Self::new(id, expiration_secs, ItemKind::Album, ALBUM_SUFFIX)
    }

    pub fn image(id: ItemId, expiration_secs: u64, extension: &str) -> Self {
        Self::new(id, expiration_secs, ItemKind::Image, extension)
    }

    /// Sidecar of a standalone image. Only expiring images carry one.
    pub fn image_meta(id: ItemId) -> Self {
        Self {
            id,
            expires: true,
            kind: ItemKind::ImageMeta,
            extension: META_SUFFIX.to_string(),
        }
    }

    fn new(id: ItemId, expiration_secs: u64, kind: ItemKind, extension: &str) -> Self {
        Self {
            id,
            expires: expiration_secs > 0,
            kind,
            extension: extension.to_string(),
        }
    }

    /// Parses a file name. Returns `None` for names outside the convention,
    /// such as in-flight temporary files.
    pub fn parse(name: &str) -> Option<Self> {
        let (stem, rest) = name.split_once('.')?;
        let id = stem.parse::<ItemId>().ok()?;
        // Only the canonical rendering counts; `find` matches on it.
        if id.to_string() != stem {
            return None;
        }

        let (expires, extension) = match rest.strip_prefix(EXPIRES_INFIX) {
            Some(extension) => (true, extension),
            None => (false, rest),
        };
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        let kind = match extension {
            PASTE_SUFFIX => ItemKind::Plain,
            ALBUM_SUFFIX => ItemKind::Album,
            META_SUFFIX => ItemKind::ImageMeta,
            _ => ItemKind::Image,
        };

        Some(Self {
            id,
            expires,
            kind,
            extension: extension.to_string(),
        })
    }

    pub fn render(&self) -> String {
        let infix = if self.expires { EXPIRES_INFIX } else { "" };
        format!("{}{}{}", self.id.file_prefix(), infix, self.extension)
    }
}
