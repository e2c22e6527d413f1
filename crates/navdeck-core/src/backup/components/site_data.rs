//! Site records, with category references repaired on restore

use super::{decode_payload, encode_payload, ApplyContext, ExportContext, RestorableComponent};
use crate::backup::archive::{AttachmentReader, AttachmentWriter};
use crate::backup::error::{ArchiveError, BackupError, MalformedArchiveError, StoreFailure};
use crate::backup::types::{CategoryFallback, ComponentKind};
use crate::model::{Site, DEFAULT_CATEGORY_ID};
use crate::storage::{CategoryStore, SiteStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Every site row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteData {
    pub sites: Vec<Site>,
}

impl RestorableComponent for SiteData {
    const KIND: ComponentKind = ComponentKind::SiteData;

    fn export(ctx: &ExportContext<'_>) -> Result<Self, BackupError> {
        Ok(Self {
            sites: SiteStore::new(ctx.conn).find_many()?,
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

    /// Replace the site table; sites pointing at an unknown category are
    /// moved to the default category.
    fn apply(&self, ctx: &mut ApplyContext<'_, '_>) -> Result<(), StoreFailure> {
        let valid = match &ctx.valid_category_ids {
            Some(ids) => ids.clone(),
            None => match ctx.options.category_fallback {
                CategoryFallback::StoreCategories => CategoryStore::new(ctx.conn).ids()?,
                CategoryFallback::DefaultOnly => BTreeSet::from([DEFAULT_CATEGORY_ID]),
            },
        };

        let store = SiteStore::new(ctx.conn);
        store.delete_many()?;

        for site in &self.sites {
            if valid.contains(&site.category_id) {
                store.create(site)?;
            } else {
                tracing::debug!(
                    site = site.id,
                    category = site.category_id,
                    "Unknown category, moving site to default"
                );
                let mut repaired = site.clone();
                repaired.category_id = DEFAULT_CATEGORY_ID;
                store.create(&repaired)?;
                ctx.reassigned_sites += 1;
            }
        }
        Ok(())
    }
}
