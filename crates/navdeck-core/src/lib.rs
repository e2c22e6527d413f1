//! navdeck core - storage and selective backup/restore
//!
//! This crate provides the `SQLite` data store and blob store behind the
//! navigation page, and the engine that snapshots any subset of that state
//! into a portable zip archive and restores it again.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod backup;
pub mod model;
pub mod storage;
pub mod util;

pub use backup::{BackupEngine, BackupSelection, ComponentKind, RestoreOptions, RestoreReport};
pub use model::{Category, MetadataEntry, Site, DEFAULT_CATEGORY_ID};
pub use storage::{Database, FsBlobStore};
