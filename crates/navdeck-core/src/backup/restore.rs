//! Restore from a backup archive

use crate::backup::archive;
use crate::backup::components::ApplyContext;
use crate::backup::error::{RestoreError, RestoreFailedError, StoreFailure};
use crate::backup::types::{BackupSelection, ComponentKind, RestoreOptions, RestoreReport};
use crate::backup::BackupEngine;
use crate::storage::{BlobJournal, CategoryStore, SiteStore};

impl BackupEngine<'_> {
    /// Restore the selected components of `archive` into the live store.
    ///
    /// Components apply in [`ComponentKind`] order inside one transaction.
    /// On any store or blob failure the transaction is rolled back, blob
    /// writes are undone, and the store is left as it was before the call.
    ///
    /// # Errors
    /// Returns [`RestoreError::Archive`] or [`RestoreError::Malformed`] if the
    /// archive cannot be decoded (nothing is modified), or
    /// [`RestoreError::Failed`] if applying it failed
    pub fn restore(
        &self,
        archive: &[u8],
        selection: &BackupSelection,
        options: &RestoreOptions,
    ) -> Result<RestoreReport, RestoreError> {
        let decoded = archive::decode(archive, selection)?;

        let mut report = RestoreReport {
            absent: decoded.absent,
            missing_attachments: decoded
                .components
                .values()
                .flat_map(|component| component.missing_attachments())
                .collect(),
            ..RestoreReport::default()
        };

        if decoded.components.is_empty() {
            tracing::info!("Archive holds none of the selected components, nothing to restore");
            return Ok(report);
        }

        let touches_sites = decoded.components.contains_key(&ComponentKind::CategoryData)
            || decoded.components.contains_key(&ComponentKind::SiteData);

        let mut journal = BlobJournal::new(self.blobs);
        let result = self.db.transaction(|tx| -> Result<usize, StoreFailure> {
            let mut ctx = ApplyContext::new(tx, &mut journal, *options);

            for (kind, component) in &decoded.components {
                tracing::debug!(%kind, "Applying component");
                component.apply(&mut ctx)?;
            }

            CategoryStore::new(tx).ensure_default()?;

            // Other slices never touch site rows
            let orphans = if touches_sites {
                SiteStore::new(tx).reassign_orphans()?
            } else {
                0
            };

            Ok(ctx.reassigned_sites + orphans)
        });

        match result {
            Ok(reassigned) => {
                report.applied = decoded.components.keys().copied().collect();
                report.reassigned_sites = reassigned;
                tracing::info!(
                    applied = report.applied.len(),
                    reassigned,
                    missing_attachments = report.missing_attachments.len(),
                    "Restore committed"
                );
                Ok(report)
            }
            Err(failure) => {
                let unrestored = journal.rollback();
                if unrestored > 0 {
                    tracing::warn!(unrestored, "Some blobs could not be rolled back");
                }
                tracing::warn!("Restore rolled back: {failure}");
                Err(RestoreFailedError::from(failure).into())
            }
        }
    }
}
