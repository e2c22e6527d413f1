//! Backup creation

use crate::backup::archive;
use crate::backup::components::{Component, ExportContext};
use crate::backup::error::BackupError;
use crate::backup::types::BackupSelection;
use crate::backup::BackupEngine;
use std::collections::BTreeMap;

impl BackupEngine<'_> {
    /// Snapshot the selected components into a zip archive.
    ///
    /// Only selected kinds are read; the store is never modified.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or the archive cannot be
    /// written
    pub fn create_backup(&self, selection: &BackupSelection) -> Result<Vec<u8>, BackupError> {
        let ctx = ExportContext {
            conn: self.db.connection(),
            blobs: self.blobs,
        };

        let mut components = BTreeMap::new();
        for kind in selection.kinds() {
            tracing::debug!(%kind, "Exporting component");
            components.insert(kind, Component::export(kind, &ctx)?);
        }

        let bytes = archive::encode(&components, selection)?;
        tracing::info!(
            components = components.len(),
            bytes = bytes.len(),
            "Backup created"
        );
        Ok(bytes)
    }
}
