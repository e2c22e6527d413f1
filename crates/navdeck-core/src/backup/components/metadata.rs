//! Ordered metadata pairs

use super::{decode_payload, encode_payload, ApplyContext, ExportContext, RestorableComponent};
use crate::backup::archive::{AttachmentReader, AttachmentWriter};
use crate::backup::error::{ArchiveError, BackupError, MalformedArchiveError, StoreFailure};
use crate::backup::types::ComponentKind;
use crate::model::MetadataEntry;
use crate::storage::MetadataStore;
use serde::{Deserialize, Serialize};

/// Every metadata pair, in store order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataList {
    pub entries: Vec<MetadataEntry>,
}

impl RestorableComponent for MetadataList {
    const KIND: ComponentKind = ComponentKind::Metadata;

    fn export(ctx: &ExportContext<'_>) -> Result<Self, BackupError> {
        Ok(Self {
            entries: MetadataStore::new(ctx.conn).find_many()?,
        })
    }

    fn load(
        payload: &[u8],
        _attachments: &mut dyn AttachmentReader,
    ) -> Result<Self, MalformedArchiveError> {
        decode_payload(Self::KIND, payload)
    }

    fn save(&self, _attachments: &mut dyn AttachmentWriter) -> Result<Vec<u8>, ArchiveError> {
        encode_payload(Self::KIND, self)
    }

    fn apply(&self, ctx: &mut ApplyContext<'_, '_>) -> Result<(), StoreFailure> {
        let store = MetadataStore::new(ctx.conn);
        store.delete_many()?;
        for entry in &self.entries {
            store.create(entry)?;
        }
        Ok(())
    }
}
