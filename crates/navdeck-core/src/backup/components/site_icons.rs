//! Uploaded per-site icons
//!
//! A collection component: one descriptor plus one attachment per site that
//! has an uploaded icon. Sites without an upload contribute nothing, and on
//! restore they lose any icon they had.

use super::{
    decode_payload, encode_payload, ApplyContext, AttachmentDescriptor, ExportContext,
    RestorableComponent,
};
use crate::backup::archive::{attachment_path, AttachmentReader, AttachmentWriter};
use crate::backup::error::{ArchiveError, BackupError, MalformedArchiveError, StoreFailure};
use crate::backup::types::ComponentKind;
use crate::storage::{Blob, BlobKey, SiteStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Manifest entry for one site's icon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteIconDescriptor {
    pub site_id: i64,
    #[serde(flatten)]
    pub attachment: AttachmentDescriptor,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SiteIconManifest {
    #[serde(default)]
    icons: Vec<SiteIconDescriptor>,
}

/// A descriptor with the bytes that were recovered for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteIcon {
    pub descriptor: SiteIconDescriptor,
    pub bytes: Option<Vec<u8>>,
}

/// Every uploaded site icon
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteIconFiles {
    pub icons: Vec<SiteIcon>,
}

impl RestorableComponent for SiteIconFiles {
    const KIND: ComponentKind = ComponentKind::SiteIconFiles;

    fn export(ctx: &ExportContext<'_>) -> Result<Self, BackupError> {
        let mut icons = Vec::new();

        for site_id in SiteStore::new(ctx.conn).ids()? {
            let key = BlobKey::SiteIcon(site_id);
            let Some(blob) = ctx.blobs.read(&key)? else {
                continue;
            };
            icons.push(SiteIcon {
                descriptor: SiteIconDescriptor {
                    site_id,
                    attachment: AttachmentDescriptor::new(
                        attachment_path(&key),
                        &blob.meta,
                        &blob.bytes,
                    ),
                },
                bytes: Some(blob.bytes),
            });
        }

        Ok(Self { icons })
    }

    fn load(
        payload: &[u8],
        attachments: &mut dyn AttachmentReader,
    ) -> Result<Self, MalformedArchiveError> {
        let manifest: SiteIconManifest = decode_payload(Self::KIND, payload)?;

        let icons = manifest
            .icons
            .into_iter()
            .map(|descriptor| {
                let bytes = descriptor.attachment.fetch(attachments);
                SiteIcon { descriptor, bytes }
            })
            .collect();

        Ok(Self { icons })
    }

    fn save(&self, attachments: &mut dyn AttachmentWriter) -> Result<Vec<u8>, ArchiveError> {
        let mut manifest = SiteIconManifest::default();

        for icon in &self.icons {
            let Some(bytes) = &icon.bytes else {
                continue;
            };
            attachments.process(&icon.descriptor.attachment.path, bytes)?;
            manifest.icons.push(icon.descriptor.clone());
        }

        encode_payload(Self::KIND, &manifest)
    }

    fn apply(&self, ctx: &mut ApplyContext<'_, '_>) -> Result<(), StoreFailure> {
        let listed: BTreeSet<i64> = self
            .icons
            .iter()
            .map(|icon| icon.descriptor.site_id)
            .collect();

        // Sites without an icon in the archive end up without one live
        let mut removed = 0;
        for site_id in SiteStore::new(ctx.conn).ids()? {
            if !listed.contains(&site_id) {
                ctx.blobs.delete(&BlobKey::SiteIcon(site_id))?;
                removed += 1;
            }
        }

        let mut written = 0;
        for icon in &self.icons {
            let site_id = icon.descriptor.site_id;
            let Some(bytes) = &icon.bytes else {
                tracing::warn!(
                    site = site_id,
                    path = %icon.descriptor.attachment.path,
                    "Icon attachment missing, skipping site"
                );
                continue;
            };

            let blob = Blob::new(bytes.clone(), icon.descriptor.attachment.meta());
            ctx.blobs.write(&BlobKey::SiteIcon(site_id), &blob)?;
            written += 1;
        }

        tracing::debug!(
            written,
            removed,
            total = self.icons.len(),
            "Restored site icons"
        );
        Ok(())
    }

    fn missing_attachments(&self) -> Vec<String> {
        self.icons
            .iter()
            .filter(|icon| icon.bytes.is_none())
            .map(|icon| icon.descriptor.attachment.path.clone())
            .collect()
    }
}
