//! Fixtures shared by unit tests.

use crate::core::Store;
use crate::core::sink::ErrorSink;
use crate::types::Config;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::error::Error;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Sink that keeps every report for later assertions.
#[derive(Default)]
pub(crate) struct RecordingSink {
    reports: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub(crate) fn reports(&self) -> Vec<String> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorSink for RecordingSink {
    fn report(&self, context: &str, error: &dyn Error) {
        self.reports
            .lock()
            .unwrap()
            .push(format!("{context}: {error}"));
    }
}

pub(crate) fn test_config(temp: &TempDir) -> Config {
    Config::new(temp.path().join("data"))
}

pub(crate) fn create_test_store() -> (Arc<Store>, Arc<RecordingSink>, TempDir) {
    let temp = TempDir::new().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let store = Store::open(&test_config(&temp), sink.clone()).unwrap();
    (Arc::new(store), sink, temp)
}

pub(crate) fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 64])
    }));
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub(crate) fn png_bytes() -> Vec<u8> {
    image_bytes(8, 8, ImageFormat::Png)
}

/// Moves a file's mtime `secs` into the past.
pub(crate) fn backdate(path: &Path, secs: u64) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(secs))
        .unwrap();
}

pub(crate) fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
