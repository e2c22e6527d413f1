//! Category records

use super::{decode_payload, encode_payload, ApplyContext, ExportContext, RestorableComponent};
use crate::backup::archive::{AttachmentReader, AttachmentWriter};
use crate::backup::error::{ArchiveError, BackupError, MalformedArchiveError, StoreFailure};
use crate::backup::types::ComponentKind;
use crate::model::Category;
use crate::storage::CategoryStore;
use serde::{Deserialize, Serialize};

/// Every category row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryData {
    pub categories: Vec<Category>,
}

impl CategoryData {
    /// Whether the archive carries its own default-category row
    #[must_use]
    pub fn supplies_default(&self) -> bool {
        self.categories.iter().any(Category::is_default)
    }
}

impl RestorableComponent for CategoryData {
    const KIND: ComponentKind = ComponentKind::CategoryData;

    fn export(ctx: &ExportContext<'_>) -> Result<Self, BackupError> {
        Ok(Self {
            categories: CategoryStore::new(ctx.conn).find_many()?,
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

    /// Replace the category table and publish the resulting id set.
    ///
    /// The built-in default row survives unless the archive supplies its own.
    fn apply(&self, ctx: &mut ApplyContext<'_, '_>) -> Result<(), StoreFailure> {
        let store = CategoryStore::new(ctx.conn);
        let supplies_default = self.supplies_default();

        let removed = store.delete_many(!supplies_default)?;
        for category in &self.categories {
            store.create(category)?;
        }
        store.ensure_default()?;

        let ids = store.ids()?;
        tracing::debug!(
            removed,
            restored = self.categories.len(),
            supplies_default,
            "Replaced categories"
        );
        ctx.valid_category_ids = Some(ids);
        Ok(())
    }
}
