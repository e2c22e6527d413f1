//! Blob storage for uploaded favicons and site icons
//!
//! Blobs are addressed by [`BlobKey`] and stored on disk under a root
//! directory, with a small JSON sidecar carrying the content type and file
//! extension.

use crate::util::{safe_join, PathError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

const META_SUFFIX: &str = ".meta.json";

/// Blob store errors
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid blob path: {0}")]
    Path(#[from] PathError),

    #[error("Invalid blob metadata for {key}: {source}")]
    Metadata {
        key: BlobKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("Blob store unavailable: {0}")]
    Unavailable(String),
}

/// Address of a blob in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKey {
    /// The single favicon shown for the navigation page itself
    SystemFavicon,
    /// An uploaded icon for one site
    SiteIcon(i64),
}

impl BlobKey {
    /// Relative, `/`-separated storage path
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::SystemFavicon => "favicon/system".to_string(),
            Self::SiteIcon(id) => format!("favicon/site/{id}"),
        }
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Content description stored alongside blob bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMeta {
    pub content_type: String,
    pub extension: String,
}

impl Default for BlobMeta {
    fn default() -> Self {
        Self {
            content_type: "application/octet-stream".to_string(),
            extension: "bin".to_string(),
        }
    }
}

/// Blob bytes plus their metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub meta: BlobMeta,
}

impl Blob {
    #[must_use]
    pub fn new(bytes: Vec<u8>, meta: BlobMeta) -> Self {
        Self { bytes, meta }
    }
}

/// Keyed binary storage
pub trait BlobStore {
    /// Read a blob, `None` if nothing is stored under `key`
    ///
    /// # Errors
    /// Returns an error if the blob exists but cannot be read
    fn read(&self, key: &BlobKey) -> Result<Option<Blob>, BlobError>;

    /// Store a blob, replacing any previous value
    ///
    /// # Errors
    /// Returns an error if the blob cannot be written
    fn write(&self, key: &BlobKey, blob: &Blob) -> Result<(), BlobError>;

    /// Remove a blob; removing a missing blob is not an error
    ///
    /// # Errors
    /// Returns an error if the blob exists but cannot be removed
    fn delete(&self, key: &BlobKey) -> Result<(), BlobError>;
}

/// Filesystem-backed blob store
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root` (created lazily on first write)
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self, key: &BlobKey) -> Result<PathBuf, BlobError> {
        Ok(safe_join(&self.root, &key.path())?)
    }

    fn meta_path(data_path: &Path) -> PathBuf {
        let mut name = data_path.as_os_str().to_os_string();
        name.push(META_SUFFIX);
        PathBuf::from(name)
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> BlobError + '_ {
    move |source| BlobError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl BlobStore for FsBlobStore {
    fn read(&self, key: &BlobKey) -> Result<Option<Blob>, BlobError> {
        let data_path = self.data_path(key)?;
        let bytes = match fs::read(&data_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&data_path)(e)),
        };

        let meta_path = Self::meta_path(&data_path);
        let meta = match fs::read_to_string(&meta_path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(%key, "Ignoring unreadable blob metadata: {e}");
                BlobMeta::default()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => BlobMeta::default(),
            Err(e) => return Err(io_err(&meta_path)(e)),
        };

        Ok(Some(Blob { bytes, meta }))
    }

    fn write(&self, key: &BlobKey, blob: &Blob) -> Result<(), BlobError> {
        let data_path = self.data_path(key)?;
        if let Some(parent) = data_path.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        fs::write(&data_path, &blob.bytes).map_err(io_err(&data_path))?;

        let meta_path = Self::meta_path(&data_path);
        let json = serde_json::to_string(&blob.meta)
            .map_err(|source| BlobError::Metadata { key: *key, source })?;
        fs::write(&meta_path, json).map_err(io_err(&meta_path))?;

        Ok(())
    }

    fn delete(&self, key: &BlobKey) -> Result<(), BlobError> {
        let data_path = self.data_path(key)?;
        let meta_path = Self::meta_path(&data_path);

        for path in [&data_path, &meta_path] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_err(path)(e)),
            }
        }
        Ok(())
    }
}

/// Undo log over a [`BlobStore`] for one restore.
///
/// Every key is snapshotted before its first write or delete. If the restore
/// fails, [`BlobJournal::rollback`] puts the snapshots back in reverse order.
pub struct BlobJournal<'a> {
    store: &'a dyn BlobStore,
    undo: Vec<(BlobKey, Option<Blob>)>,
}

impl<'a> BlobJournal<'a> {
    #[must_use]
    pub fn new(store: &'a dyn BlobStore) -> Self {
        Self {
            store,
            undo: Vec::new(),
        }
    }

    /// Write through to the store, remembering the previous value
    ///
    /// # Errors
    /// Returns an error if the previous value cannot be read or the write fails
    pub fn write(&mut self, key: &BlobKey, blob: &Blob) -> Result<(), BlobError> {
        self.remember(key)?;
        self.store.write(key, blob)
    }

    /// Delete through to the store, remembering the previous value
    ///
    /// # Errors
    /// Returns an error if the previous value cannot be read or the delete fails
    pub fn delete(&mut self, key: &BlobKey) -> Result<(), BlobError> {
        self.remember(key)?;
        self.store.delete(key)
    }

    fn remember(&mut self, key: &BlobKey) -> Result<(), BlobError> {
        if self.undo.iter().any(|(seen, _)| seen == key) {
            return Ok(());
        }
        let prior = self.store.read(key)?;
        self.undo.push((*key, prior));
        Ok(())
    }

    /// Number of distinct keys touched so far
    #[must_use]
    pub fn touched(&self) -> usize {
        self.undo.len()
    }

    /// Restore every touched key to its previous value.
    ///
    /// Returns the number of keys that could not be restored; each failure is
    /// logged.
    pub fn rollback(self) -> usize {
        let mut failures = 0;
        for (key, prior) in self.undo.into_iter().rev() {
            let result = match &prior {
                Some(blob) => self.store.write(&key, blob),
                None => self.store.delete(&key),
            };
            if let Err(e) = result {
                tracing::warn!(%key, "Failed to roll back blob: {e}");
                failures += 1;
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn png(bytes: &[u8]) -> Blob {
        Blob::new(
            bytes.to_vec(),
            BlobMeta {
                content_type: "image/png".to_string(),
                extension: "png".to_string(),
            },
        )
    }

    #[test]
    fn test_key_paths() {
        assert_eq!(BlobKey::SystemFavicon.path(), "favicon/system");
        assert_eq!(BlobKey::SiteIcon(12).path(), "favicon/site/12");
    }

    #[test]
    fn test_write_read_delete() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path());
        let key = BlobKey::SiteIcon(3);

        assert!(store.read(&key).unwrap().is_none());

        store.write(&key, &png(b"\x89PNG")).unwrap();
        assert_eq!(store.read(&key).unwrap(), Some(png(b"\x89PNG")));
        assert!(dir.path().join("favicon/site/3.meta.json").exists());

        store.delete(&key).unwrap();
        assert!(store.read(&key).unwrap().is_none());
        store.delete(&key).unwrap();
    }

    #[test]
    fn test_missing_sidecar_uses_default_meta() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path());
        fs::create_dir_all(dir.path().join("favicon")).unwrap();
        fs::write(dir.path().join("favicon/system"), b"ico").unwrap();

        let blob = store.read(&BlobKey::SystemFavicon).unwrap().unwrap();
        assert_eq!(blob.meta, BlobMeta::default());
    }

    #[test]
    fn test_corrupt_sidecar_uses_default_meta() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path());
        let key = BlobKey::SiteIcon(5);
        store.write(&key, &png(b"old")).unwrap();
        fs::write(dir.path().join("favicon/site/5.meta.json"), "{broken").unwrap();

        let blob = store.read(&key).unwrap().unwrap();
        assert_eq!(blob, Blob::new(b"old".to_vec(), BlobMeta::default()));

        let mut journal = BlobJournal::new(&store);
        journal.write(&key, &png(b"new")).unwrap();
        assert_eq!(journal.rollback(), 0);
        assert_eq!(
            store.read(&key).unwrap(),
            Some(Blob::new(b"old".to_vec(), BlobMeta::default()))
        );
    }

    #[test]
    fn test_journal_rollback_restores_previous_state() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path());
        store.write(&BlobKey::SystemFavicon, &png(b"old")).unwrap();

        let mut journal = BlobJournal::new(&store);
        journal.write(&BlobKey::SystemFavicon, &png(b"new")).unwrap();
        journal.write(&BlobKey::SystemFavicon, &png(b"newer")).unwrap();
        journal.write(&BlobKey::SiteIcon(1), &png(b"icon")).unwrap();
        assert_eq!(journal.touched(), 2);

        assert_eq!(journal.rollback(), 0);
        assert_eq!(
            store.read(&BlobKey::SystemFavicon).unwrap(),
            Some(png(b"old"))
        );
        assert!(store.read(&BlobKey::SiteIcon(1)).unwrap().is_none());
    }
}
