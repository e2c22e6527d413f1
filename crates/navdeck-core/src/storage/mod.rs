//! Storage layer (`SQLite` slices + blob files)

pub mod blobs;
pub mod categories;
pub mod db;
pub mod metadata;
pub mod migrations;
pub mod settings;
pub mod sites;

pub use blobs::{Blob, BlobError, BlobJournal, BlobKey, BlobMeta, BlobStore, FsBlobStore};
pub use categories::CategoryStore;
pub use db::{Database, DatabaseError};
pub use metadata::MetadataStore;
pub use settings::SettingStore;
pub use sites::SiteStore;
