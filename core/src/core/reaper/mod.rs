//! Background sweep enforcing the data directory size cap and item expiration.
//!
//! A sweep is stateless and idempotent:
//! 1. If the data directory exceeds its size cap, every file is deleted.
//! 2. Otherwise every `expires.` file is visited. Albums expire image by image
//!    and are deleted once none of their images remain. A standalone image
//!    expires by the expiration in its sidecar, and the sidecar goes with it.
//!    Pastes expire as a whole. Expiring images that neither an album nor a
//!    readable sidecar accounts for are deleted once older than the orphan
//!    image TTL.
//!
//! Age is `now - mtime`. An item becomes eligible once its age is strictly
//! greater than its expiration.

use crate::core::Store;
use crate::core::error::StoreError;
use crate::core::file_storage::DataFile;
use crate::core::sink::ErrorSink;
use crate::types::{Config, ItemFileName, ItemKind};
use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

pub struct Reaper {
    store: Arc<Store>,
    max_data_dir_bytes: u64,
    orphan_image_ttl: Duration,
    sink: Arc<dyn ErrorSink>,
}

/// What a single sweep did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepOutcome {
    /// The size cap was exceeded and the directory was cleared.
    pub cleared: bool,
    pub files_cleared: usize,
    pub pastes_removed: usize,
    pub images_removed: usize,
    pub albums_removed: usize,
    /// Candidates skipped because of an error.
    pub failures: usize,
}

impl SweepOutcome {
    pub fn removed(&self) -> usize {
        self.files_cleared + self.pastes_removed + self.images_removed + self.albums_removed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    Removed,
    Kept,
    Missing,
}

impl Reaper {
    pub fn new(store: Arc<Store>, config: &Config, sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            store,
            max_data_dir_bytes: config.max_data_dir_bytes,
            orphan_image_ttl: config.orphan_image_ttl,
            sink,
        }
    }

    /// Sweeps against the current time. Never fails; a sweep that cannot list
    /// the directory is reported and returns an empty outcome.
    pub fn sweep(&self) -> SweepOutcome {
        match self.sweep_at(SystemTime::now()) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.sink.report("sweep aborted", &e);
                SweepOutcome::default()
            }
        }
    }

    /// Sweeps as if the current time were `now`.
    ///
    /// Returns `Err` only if the data directory itself cannot be listed;
    /// per-item problems, including files a size-cap clear cannot remove, are
    /// reported and counted in `failures`.
    pub fn sweep_at(&self, now: SystemTime) -> Result<SweepOutcome, StoreError> {
        let files = self.store.files();
        let entries = files.list()?;
        let mut outcome = SweepOutcome::default();

        let total: u64 = entries.iter().map(|entry| entry.len).sum();
        if total > self.max_data_dir_bytes {
            warn!(
                total,
                cap = self.max_data_dir_bytes,
                "data directory over size cap; clearing"
            );
            let mut failures = 0;
            let removed = files.remove_each(&entries, |path, e| {
                failures += 1;
                self.sink
                    .report(&format!("could not clear {}", path.display()), &e);
            });
            outcome.cleared = true;
            outcome.files_cleared = removed;
            outcome.failures = failures;
            return Ok(outcome);
        }

        let mut albums = Vec::new();
        let mut metas = Vec::new();
        let mut pastes = Vec::new();
        let mut images = Vec::new();
        for entry in &entries {
            let Some(name) = ItemFileName::parse(&entry.name) else {
                continue;
            };
            if !name.expires {
                continue;
            }
            match name.kind {
                ItemKind::Album => albums.push(entry),
                ItemKind::ImageMeta => metas.push(entry),
                ItemKind::Plain => pastes.push(entry),
                ItemKind::Image => images.push((entry, name)),
            }
        }

        let mut owned_images = HashSet::new();
        for entry in albums {
            let result = self.reap_album(entry, now, &mut outcome, &mut owned_images);
            self.settle(result, &entry.path, &mut outcome);
        }

        for entry in metas {
            let result = self.reap_standalone_image(entry, now, &mut outcome, &mut owned_images);
            self.settle(result, &entry.path, &mut outcome);
        }

        for entry in pastes {
            let result = self.reap_paste(entry, now, &mut outcome);
            self.settle(result, &entry.path, &mut outcome);
        }

        for (entry, name) in images {
            if owned_images.contains(&name.render()) {
                continue;
            }
            let result = self.try_remove(&entry.path, self.orphan_image_ttl, now);
            match result {
                Ok(Removal::Removed) => {
                    debug!(path = %entry.path.display(), "removed image without metadata");
                    outcome.images_removed += 1;
                }
                Ok(_) => {}
                Err(e) => self.settle(Err(e.into()), &entry.path, &mut outcome),
            }
        }

        if outcome.removed() > 0 {
            info!(
                pastes = outcome.pastes_removed,
                images = outcome.images_removed,
                albums = outcome.albums_removed,
                failures = outcome.failures,
                "sweep removed expired items"
            );
        } else {
            debug!(failures = outcome.failures, "sweep found nothing to remove");
        }
        Ok(outcome)
    }

    fn reap_album(
        &self,
        entry: &DataFile,
        now: SystemTime,
        outcome: &mut SweepOutcome,
        owned_images: &mut HashSet<String>,
    ) -> Result<(), StoreError> {
        let records = self.store.read_album(&entry.path)?;

        let mut remaining = 0usize;
        for record in &records {
            owned_images.insert(record.file_name.clone());
            let Some(path) = self.store.image_path(record) else {
                remaining += 1;
                continue;
            };

            match self.try_remove_expired(&path, record.expiration_secs, now) {
                Ok(Removal::Removed) => outcome.images_removed += 1,
                Ok(Removal::Kept) => remaining += 1,
                Ok(Removal::Missing) => {}
                Err(e) => {
                    remaining += 1;
                    self.settle(Err(e.into()), &path, outcome);
                }
            }
        }

        if remaining == 0 && self.store.files().remove_if_exists(&entry.path)? {
            debug!(path = %entry.path.display(), "removed emptied album");
            outcome.albums_removed += 1;
        }
        Ok(())
    }

    /// Expires a standalone image by its sidecar, removing the sidecar once the
    /// image is gone.
    fn reap_standalone_image(
        &self,
        entry: &DataFile,
        now: SystemTime,
        outcome: &mut SweepOutcome,
        owned_images: &mut HashSet<String>,
    ) -> Result<(), StoreError> {
        let record = self.store.read_image_meta(&entry.path)?;
        owned_images.insert(record.file_name.clone());
        let Some(path) = self.store.image_path(&record) else {
            return Ok(());
        };

        match self.try_remove_expired(&path, record.expiration_secs, now)? {
            Removal::Kept => return Ok(()),
            Removal::Removed => {
                debug!(id = %record.id, "removed expired image");
                outcome.images_removed += 1;
            }
            Removal::Missing => {}
        }
        self.store.files().remove_if_exists(&entry.path)?;
        Ok(())
    }

    fn reap_paste(
        &self,
        entry: &DataFile,
        now: SystemTime,
        outcome: &mut SweepOutcome,
    ) -> Result<(), StoreError> {
        let record = self.store.read_plain(&entry.path)?;

        if self.try_remove_expired(&entry.path, record.expiration_secs, now)? == Removal::Removed {
            debug!(id = %record.id, "removed expired paste");
            outcome.pastes_removed += 1;
        }
        Ok(())
    }

    /// Items with zero expiration never age out.
    fn try_remove_expired(
        &self,
        path: &Path,
        expiration_secs: u64,
        now: SystemTime,
    ) -> io::Result<Removal> {
        if expiration_secs == 0 {
            return Ok(if path.exists() {
                Removal::Kept
            } else {
                Removal::Missing
            });
        }
        self.try_remove(path, Duration::from_secs(expiration_secs), now)
    }

    fn try_remove(&self, path: &Path, ttl: Duration, now: SystemTime) -> io::Result<Removal> {
        let modified = match std::fs::metadata(path) {
            Ok(metadata) => metadata.modified()?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Removal::Missing),
            Err(e) => return Err(e),
        };

        // An mtime in the future counts as age zero.
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age <= ttl {
            return Ok(Removal::Kept);
        }

        Ok(if self.store.files().remove_if_exists(path)? {
            Removal::Removed
        } else {
            Removal::Missing
        })
    }

    /// Records a per-candidate failure. A candidate that vanished mid-sweep is not one.
    fn settle(&self, result: Result<(), StoreError>, path: &Path, outcome: &mut SweepOutcome) {
        match result {
            Ok(()) | Err(StoreError::NotFound(_)) => {}
            Err(e) => {
                outcome.failures += 1;
                self.sink
                    .report(&format!("skipping sweep candidate {}", path.display()), &e);
            }
        }
    }
}

/// Scheduling.
impl Reaper {
    /// Sweeps immediately, then once per `interval`, until `stop` receives a
    /// message or its sender is dropped.
    pub fn run(&self, interval: Duration, stop: mpsc::Receiver<()>) {
        loop {
            self.sweep();
            match stop.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("reaper stopped");
    }

    /// Runs [`Reaper::run`] on a dedicated thread.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> io::Result<ReaperHandle> {
        let (stop, stop_rx) = mpsc::channel();
        let thread = std::thread::Builder::new()
            .name("reaper".to_string())
            .spawn(move || self.run(interval, stop_rx))?;
        Ok(ReaperHandle { stop, thread })
    }
}

pub struct ReaperHandle {
    stop: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

impl ReaperHandle {
    /// Stops the loop after any in-flight sweep and waits for the thread.
    pub fn shutdown(self) {
        let _ = self.stop.send(());
        if self.thread.join().is_err() {
            warn!("reaper thread panicked");
        }
    }

    /// Blocks for as long as the reaper thread runs. The loop is kept alive
    /// while this call waits.
    pub fn join(self) {
        let ReaperHandle { stop, thread } = self;
        if thread.join().is_err() {
            warn!("reaper thread panicked");
        }
        drop(stop);
    }
}
