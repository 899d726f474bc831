//! Storage layer for parktally.
//!
//! The registry persists through a [`SnapshotStore`]: a document store with
//! read-whole and write-whole semantics. [`JsonFileStore`] keeps the document
//! in a single file; [`MemoryStore`] keeps it in memory for tests and
//! embedding. The document format lives in [`snapshot`].

pub mod snapshot;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::{Error, Result};

pub use snapshot::LocationMap;

/// A durable home for the registry snapshot.
///
/// Every call is a whole-document operation. Implementations must not hold
/// locks or handles across calls.
pub trait SnapshotStore: Send + std::fmt::Debug {
    /// Read the stored document.
    ///
    /// Returns `None` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read.
    fn read_document(&self) -> Result<Option<String>>;

    /// Replace the stored document with `document`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn write_document(&self, document: &str) -> Result<()>;

    /// Where the document lives, for log messages.
    fn describe(&self) -> String;
}

/// Snapshot storage in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// Path to the snapshot file.
    path: PathBuf,
    /// Write through a temporary sibling and rename over the target.
    atomic_writes: bool,
}

impl JsonFileStore {
    /// Create a store for the file at `path`, with atomic writes enabled.
    ///
    /// Nothing is touched on disk until the first write.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            atomic_writes: true,
        }
    }

    /// Enable or disable write-then-rename.
    #[must_use]
    pub fn with_atomic_writes(mut self, atomic_writes: bool) -> Self {
        self.atomic_writes = atomic_writes;
        self
    }

    /// Get the path to the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether writes go through a temporary file.
    #[must_use]
    pub fn atomic_writes(&self) -> bool {
        self.atomic_writes
    }

    fn write_error(&self, source: std::io::Error) -> Error {
        Error::StorageWrite {
            path: self.path.clone(),
            source,
        }
    }

    /// The sibling file used for atomic writes.
    fn temp_path(&self) -> Result<PathBuf> {
        let file_name = self.path.file_name().ok_or_else(|| {
            self.write_error(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "snapshot path has no file name",
            ))
        })?;
        let mut temp_name = OsString::from(".");
        temp_name.push(file_name);
        temp_name.push(".tmp");
        Ok(self.path.with_file_name(temp_name))
    }
}

impl SnapshotStore for JsonFileStore {
    fn read_document(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            debug!("No snapshot at {}", self.path.display());
            return Ok(None);
        }

        let document = std::fs::read_to_string(&self.path).map_err(|source| Error::StorageRead {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(document))
    }

    fn write_document(&self, document: &str) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        if self.atomic_writes {
            let temp_path = self.temp_path()?;
            std::fs::write(&temp_path, document).map_err(|source| self.write_error(source))?;
            if let Err(source) = std::fs::rename(&temp_path, &self.path) {
                let _ = std::fs::remove_file(&temp_path);
                return Err(self.write_error(source));
            }
        } else {
            std::fs::write(&self.path, document).map_err(|source| self.write_error(source))?;
        }

        debug!(
            "Wrote {} bytes to {}",
            document.len(),
            self.path.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Snapshot storage held in memory.
///
/// Clones share the same document, so a caller can keep a handle to inspect
/// what the registry wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    document: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `document`.
    #[must_use]
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Arc::new(Mutex::new(Some(document.into()))),
        }
    }

    /// The current document, if any.
    #[must_use]
    pub fn document(&self) -> Option<String> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn read_document(&self) -> Result<Option<String>> {
        Ok(self.document())
    }

    fn write_document(&self, document: &str) -> Result<()> {
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = Some(document.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        ":memory:".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert!(store.read_document().unwrap().is_none());
        assert_eq!(store.describe(), ":memory:");
    }

    #[test]
    fn test_memory_store_write_replaces() {
        let store = MemoryStore::new();
        let handle = store.clone();

        store.write_document("{}").unwrap();
        store.write_document("{\"a\": 1}").unwrap();

        assert_eq!(handle.document().as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_memory_store_with_document() {
        let store = MemoryStore::with_document("{}");
        assert_eq!(store.read_document().unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_store_missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("parkingData.json"));
        assert!(store.read_document().unwrap().is_none());
    }

    #[test]
    fn test_file_store_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parkingData.json");
        let store = JsonFileStore::new(&path);

        store.write_document("{\n  \"a\": 1\n}").unwrap();

        assert_eq!(
            store.read_document().unwrap().as_deref(),
            Some("{\n  \"a\": 1\n}")
        );
        assert_eq!(store.path(), path);
        assert_eq!(store.describe(), path.display().to_string());
    }

    #[test]
    fn test_file_store_atomic_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("parkingData.json"));
        assert!(store.atomic_writes());

        store.write_document("{}").unwrap();
        store.write_document("{}").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![OsString::from("parkingData.json")]);
    }

    #[test]
    fn test_file_store_direct_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parkingData.json");
        let store = JsonFileStore::new(&path).with_atomic_writes(false);

        store.write_document("first, and longer than the second").unwrap();
        store.write_document("second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/parkingData.json");
        let store = JsonFileStore::new(&path);

        store.write_document("{}").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_file_store_write_failure_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file in the way").unwrap();

        let store = JsonFileStore::new(blocker.join("parkingData.json"));
        let err = store.write_document("{}").unwrap_err();
        assert!(err.is_storage_error());
    }

    #[test]
    fn test_file_store_read_directory_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        let err = store.read_document().unwrap_err();
        assert!(matches!(err, Error::StorageRead { .. }));
    }
}
