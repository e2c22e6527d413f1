//! The system favicon

use super::{
    decode_payload, encode_payload, ApplyContext, AttachmentDescriptor, ExportContext,
    RestorableComponent,
};
use crate::backup::archive::{attachment_path, AttachmentReader, AttachmentWriter};
use crate::backup::error::{ArchiveError, BackupError, MalformedArchiveError, StoreFailure};
use crate::backup::types::ComponentKind;
use crate::storage::{Blob, BlobKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct FaviconManifest {
    #[serde(default)]
    favicon: Option<AttachmentDescriptor>,
}

/// The uploaded favicon, if one existed when the backup was taken
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Favicon {
    pub descriptor: Option<AttachmentDescriptor>,
    /// `None` with a descriptor present means the attachment was lost
    pub bytes: Option<Vec<u8>>,
}

impl RestorableComponent for Favicon {
    const KIND: ComponentKind = ComponentKind::Favicon;

    fn export(ctx: &ExportContext<'_>) -> Result<Self, BackupError> {
        let Some(blob) = ctx.blobs.read(&BlobKey::SystemFavicon)? else {
            return Ok(Self::default());
        };
        let path = attachment_path(&BlobKey::SystemFavicon);
        Ok(Self {
            descriptor: Some(AttachmentDescriptor::new(path, &blob.meta, &blob.bytes)),
            bytes: Some(blob.bytes),
        })
    }

    fn load(
        payload: &[u8],
        attachments: &mut dyn AttachmentReader,
    ) -> Result<Self, MalformedArchiveError> {
        let manifest: FaviconManifest = decode_payload(Self::KIND, payload)?;
        let bytes = manifest
            .favicon
            .as_ref()
            .and_then(|descriptor| descriptor.fetch(attachments));
        Ok(Self {
            descriptor: manifest.favicon,
            bytes,
        })
    }

    fn save(&self, attachments: &mut dyn AttachmentWriter) -> Result<Vec<u8>, ArchiveError> {
        // A lost attachment cannot be re-exported, so drop its descriptor too
        let favicon = match (&self.descriptor, &self.bytes) {
            (Some(descriptor), Some(bytes)) => {
                attachments.process(&descriptor.path, bytes)?;
                Some(descriptor.clone())
            }
            _ => None,
        };
        encode_payload(Self::KIND, &FaviconManifest { favicon })
    }

    fn apply(&self, ctx: &mut ApplyContext<'_, '_>) -> Result<(), StoreFailure> {
        match (&self.descriptor, &self.bytes) {
            (None, _) => ctx.blobs.delete(&BlobKey::SystemFavicon)?,
            (Some(descriptor), Some(bytes)) => {
                let blob = Blob::new(bytes.clone(), descriptor.meta());
                ctx.blobs.write(&BlobKey::SystemFavicon, &blob)?;
            }
            (Some(descriptor), None) => {
                tracing::warn!(
                    path = %descriptor.path,
                    "Favicon attachment missing, keeping the current favicon"
                );
            }
        }
        Ok(())
    }

    fn missing_attachments(&self) -> Vec<String> {
        match (&self.descriptor, &self.bytes) {
            (Some(descriptor), None) => vec![descriptor.path.clone()],
            _ => Vec::new(),
        }
    }
}
