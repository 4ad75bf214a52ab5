use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::key::Fingerprint;

/// Errors surfaced by the disk store.
///
/// `NotFound` is the miss signal; callers treat it as "go fetch", not as a
/// failure. Everything else is a real I/O problem and propagates.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cache entry not found")]
    NotFound,
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat, disk-backed store: one file per fingerprint under a root directory.
///
/// Entries are written once and never expired or evicted; deleting files by
/// hand is the only invalidation path. Concurrent writers to the same
/// fingerprint race benignly (identical requests record identical bytes).
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Open a store rooted at `root`, creating the directory if absent.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(fingerprint.as_str())
    }

    /// Read the recorded bytes for `fingerprint`, or `NotFound` on a miss.
    pub async fn get(&self, fingerprint: &Fingerprint) -> Result<Vec<u8>, StoreError> {
        match fs::read(self.entry_path(fingerprint)).await {
            Ok(bytes) => {
                debug!(
                    target: "recap::cache",
                    %fingerprint,
                    len = bytes.len(),
                    "Cache hit"
                );
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Write (or overwrite) the entry for `fingerprint`. Last writer wins.
    pub async fn put(&self, fingerprint: &Fingerprint, bytes: &[u8]) -> Result<(), StoreError> {
        fs::write(self.entry_path(fingerprint), bytes).await?;
        debug!(
            target: "recap::cache",
            %fingerprint,
            len = bytes.len(),
            "Recorded cache entry"
        );
        Ok(())
    }
}
