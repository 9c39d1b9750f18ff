//! Durable read/write of the last-processed update id.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the offset store. Every variant is tolerated by the
/// caller (treated as "no offset" or "save may succeed next time") rather
/// than propagated as fatal, per the error handling table.
#[derive(Debug, Error)]
pub enum OffsetStoreError {
    /// The offset file could not be written.
    #[error("failed to persist offset to {path}: {source}")]
    Write {
        /// The destination path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for offset store operations.
pub type OffsetStoreResult<T> = Result<T, OffsetStoreError>;

/// Reads and writes the next-offset file.
pub struct OffsetStore {
    path: PathBuf,
}

impl OffsetStore {
    /// Creates a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the persisted offset. Malformed content or a missing file is
    /// treated as "no offset" rather than an error.
    pub async fn load(&self) -> Option<u64> {
        let contents = tokio::fs::read_to_string(&self.path).await.ok()?;
        contents.trim().parse::<u64>().ok()
    }

    /// Persists `offset` atomically: write to a sibling temp file, then
    /// rename over the target. A crash mid-write leaves the original file
    /// (or no file) untouched, unlike a direct in-place write.
    pub async fn save(&self, offset: u64) -> OffsetStoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| OffsetStoreError::Write {
                        path: self.path.clone(),
                        source,
                    })?;
            }
        }
        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, format!("{offset}\n"))
            .await
            .map_err(|source| OffsetStoreError::Write {
                path: tmp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| OffsetStoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "update_id".to_string());
        self.path
            .with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()))
    }

    /// The configured path, for diagnostics.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_no_offset() {
        let dir = tempfile::tempdir().unwrap();
        let store = OffsetStore::new(dir.path().join("update_id"));
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn malformed_contents_is_no_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("update_id");
        tokio::fs::write(&path, "not-a-number").await.unwrap();
        let store = OffsetStore::new(path);
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = OffsetStore::new(dir.path().join("nested").join("update_id"));
        store.save(42).await.unwrap();
        assert_eq!(store.load().await, Some(42));
    }

    #[tokio::test]
    async fn save_tolerates_trailing_whitespace_on_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("update_id");
        tokio::fs::write(&path, "7\n").await.unwrap();
        let store = OffsetStore::new(path);
        assert_eq!(store.load().await, Some(7));
    }

    #[tokio::test]
    async fn offsets_saved_in_sequence_are_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let store = OffsetStore::new(dir.path().join("update_id"));
        for offset in [1u64, 5, 5, 9] {
            store.save(offset).await.unwrap();
            assert_eq!(store.load().await, Some(offset));
        }
    }
}
