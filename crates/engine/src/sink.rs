use crate::StatsSink;
use core::convert::Infallible;
use courier_types::BundleStats;
use parking_lot::Mutex;
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Errors returned by [`JsonlStatsSink`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SinkError {
    /// The log file could not be opened or written.
    #[error("stats log {}: {source}", path.display())]
    Io {
        /// The log file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The snapshot could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Appends one JSON line per stats snapshot to a file.
#[derive(Debug)]
pub struct JsonlStatsSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlStatsSink {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Io { path: path.clone(), source })?;
        Ok(Self { path, file: Mutex::new(file) })
    }

    /// The log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatsSink for JsonlStatsSink {
    type Error = SinkError;

    fn record(&self, stats: &BundleStats) -> Result<(), Self::Error> {
        let mut line = serde_json::to_vec(stats)?;
        line.push(b'\n');
        // One write per line keeps concurrent snapshots from interleaving.
        self.file
            .lock()
            .write_all(&line)
            .map_err(|source| SinkError::Io { path: self.path.clone(), source })
    }
}

/// Keeps snapshots in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatsSink {
    snapshots: Arc<Mutex<Vec<BundleStats>>>,
}

impl MemoryStatsSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every snapshot recorded so far, in order.
    pub fn snapshots(&self) -> Vec<BundleStats> {
        self.snapshots.lock().clone()
    }

    /// The last snapshot per bundle, in order of first appearance.
    pub fn latest(&self) -> Vec<BundleStats> {
        let snapshots = self.snapshots.lock();
        let mut latest: Vec<BundleStats> = Vec::new();
        for snapshot in snapshots.iter() {
            match latest.iter_mut().find(|s| {
                s.bundle_id == snapshot.bundle_id && s.target_block == snapshot.target_block
            }) {
                Some(existing) => *existing = snapshot.clone(),
                None => latest.push(snapshot.clone()),
            }
        }
        latest
    }
}

impl StatsSink for MemoryStatsSink {
    type Error = Infallible;

    fn record(&self, stats: &BundleStats) -> Result<(), Self::Error> {
        self.snapshots.lock().push(stats.clone());
        Ok(())
    }
}
