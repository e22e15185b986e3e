//! Flat data directory I/O.
//!
//! Every item is one regular file directly under `data_dir`. Writes land in a
//! hidden temporary file first and are renamed into place, so a file is only
//! discoverable under its final name once fully written.

use crate::types::ItemFileName;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub(crate) const TEMP_PREFIX: &str = ".incoming-";

pub struct FileStorage {
    pub data_dir: PathBuf,
}

/// A regular file found in the data directory.
#[derive(Debug, Clone)]
pub struct DataFile {
    pub path: PathBuf,
    pub name: String,
    pub len: u64,
}

impl FileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn ensure_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }

    pub fn path_for(&self, name: &ItemFileName) -> PathBuf {
        self.data_dir.join(name.render())
    }

    /// Writes `bytes` under `name`, failing if that name is already taken.
    pub fn write_new(&self, name: &ItemFileName, bytes: &[u8]) -> io::Result<PathBuf> {
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.data_dir)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;

        let path = self.path_for(name);
        temp.persist_noclobber(&path).map_err(|e| e.error)?;
        Ok(path)
    }

    pub fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    /// Returns `false` if the file was already gone.
    pub fn remove_if_exists(&self, path: &Path) -> io::Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Lists regular files in the data directory.
    ///
    /// Entries that vanish between listing and stat are skipped.
    pub fn list(&self) -> io::Result<Vec<DataFile>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            if !metadata.is_file() {
                continue;
            }

            files.push(DataFile {
                path: entry.path(),
                name: entry.file_name().to_string_lossy().into_owned(),
                len: metadata.len(),
            });
        }

        Ok(files)
    }

    /// Removes every listed file, carrying on past failures. Each failure is
    /// handed to `on_error`. Returns how many files were removed.
    pub fn remove_each(
        &self,
        files: &[DataFile],
        mut on_error: impl FnMut(&Path, io::Error),
    ) -> usize {
        let mut removed = 0;
        for file in files {
            match self.remove_if_exists(&file.path) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => on_error(&file.path, e),
            }
        }
        removed
    }
}
