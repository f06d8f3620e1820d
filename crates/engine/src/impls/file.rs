use crate::{BuildRequest, BundleSource};
use courier_types::BundleDraft;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Errors returned by [`FileBundleSource`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FileSourceError {
    /// The payload file could not be read.
    #[error("failed to read bundle payload {}: {source}", path.display())]
    Io {
        /// The payload path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The payload file is not a valid bundle draft.
    #[error("failed to parse bundle payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The payload file contains no transactions.
    #[error("bundle payload contains no transactions")]
    Empty,
}

/// A [`BundleSource`] reading pre-signed transactions from a JSON file.
///
/// The file is re-read on every request, so an external signer can replace
/// it between attempts (e.g. with raised fees). Its format is
///
/// ```json
/// { "txs": ["0x02f8..."], "declaredMaxGas": 250000, "declaredMaxCost": "0x..." }
/// ```
#[derive(Debug, Clone)]
pub struct FileBundleSource {
    path: PathBuf,
}

impl FileBundleSource {
    /// Create a new source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the payload path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BundleSource for FileBundleSource {
    type Error = FileSourceError;

    async fn build_bundle(&self, request: &BuildRequest) -> Result<BundleDraft, Self::Error> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|source| FileSourceError::Io { path: self.path.clone(), source })?;
        let draft: BundleDraft = serde_json::from_slice(&raw)?;
        if draft.txs.is_empty() {
            return Err(FileSourceError::Empty);
        }
        debug!(
            attempt = request.attempt,
            txs = draft.txs.len(),
            path = %self.path.display(),
            "Loaded bundle payload"
        );
        Ok(draft)
    }
}
