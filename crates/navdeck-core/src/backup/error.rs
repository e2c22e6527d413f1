//! Backup and restore errors

use crate::backup::types::ComponentKind;
use crate::storage::{BlobError, DatabaseError};
use thiserror::Error;

/// Errors reading or writing the archive container
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to encode {kind} manifest: {source}")]
    Encode {
        kind: ComponentKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),
}

/// A selected manifest entry exists but does not decode into its shape
#[derive(Error, Debug)]
#[error("Malformed {kind} manifest: {source}")]
pub struct MalformedArchiveError {
    pub kind: ComponentKind,
    #[source]
    pub source: serde_json::Error,
}

/// A manifest references an attachment that is absent or unusable.
///
/// Never fatal: the owning component keeps a hole for that attachment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Attachment {path} unavailable: {reason}")]
pub struct AttachmentMissingError {
    pub path: String,
    pub reason: String,
}

impl AttachmentMissingError {
    #[must_use]
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Failure inside the restore transaction
#[derive(Error, Debug)]
pub enum StoreFailure {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Blob(#[from] BlobError),
}

/// The restore transaction failed and was rolled back
#[derive(Error, Debug)]
#[error("Restore failed and was rolled back: {source}")]
pub struct RestoreFailedError {
    #[from]
    pub source: StoreFailure,
}

/// Errors while creating a backup
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Reserved: selections are currently accepted as-is
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
}

/// Errors while restoring a backup
#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("Cannot read archive: {0}")]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Malformed(#[from] MalformedArchiveError),

    #[error(transparent)]
    Failed(#[from] RestoreFailedError),
}
