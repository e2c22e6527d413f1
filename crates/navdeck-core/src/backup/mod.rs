//! Selective backup and restore
//!
//! A backup snapshots any subset of six component kinds into one zip
//! archive; a restore applies any subset of an archive back into the store
//! inside a single transaction.

pub mod archive;
pub mod components;
pub mod create;
pub mod error;
pub mod restore;
pub mod types;

use crate::storage::{BlobStore, Database};

pub use archive::{inspect, ArchiveSummary};
pub use error::{
    ArchiveError, AttachmentMissingError, BackupError, MalformedArchiveError, RestoreError,
    RestoreFailedError,
};
pub use types::{
    backup_filename, BackupSelection, CategoryFallback, ComponentKind, RestoreOptions,
    RestoreReport,
};

/// Entry point for creating and restoring backups.
///
/// Holds no state between calls; every backup or restore is independent.
pub struct BackupEngine<'a> {
    db: &'a Database,
    blobs: &'a dyn BlobStore,
}

impl<'a> BackupEngine<'a> {
    /// Create an engine over a database and a blob store
    pub fn new(db: &'a Database, blobs: &'a dyn BlobStore) -> Self {
        Self { db, blobs }
    }
}
