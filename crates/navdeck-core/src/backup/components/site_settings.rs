//! Site title and copyright

use super::{decode_payload, encode_payload, ApplyContext, ExportContext, RestorableComponent};
use crate::backup::archive::{AttachmentReader, AttachmentWriter};
use crate::backup::error::{ArchiveError, BackupError, MalformedArchiveError, StoreFailure};
use crate::backup::types::ComponentKind;
use crate::storage::settings::{SITE_COPYRIGHT_KEY, SITE_TITLE_KEY};
use crate::storage::SettingStore;
use serde::{Deserialize, Serialize};

/// Site-wide display settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteSettings {
    pub title: Option<String>,
    pub copyright: Option<String>,
}

impl RestorableComponent for SiteSettings {
    const KIND: ComponentKind = ComponentKind::SiteSettings;

    fn export(ctx: &ExportContext<'_>) -> Result<Self, BackupError> {
        let settings = SettingStore::new(ctx.conn);
        Ok(Self {
            title: settings.get(SITE_TITLE_KEY)?,
            copyright: settings.get(SITE_COPYRIGHT_KEY)?,
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
        let settings = SettingStore::new(ctx.conn);
        settings.delete_many(&[SITE_TITLE_KEY, SITE_COPYRIGHT_KEY])?;

        if let Some(title) = &self.title {
            settings.create(SITE_TITLE_KEY, title)?;
        }
        if let Some(copyright) = &self.copyright {
            settings.create(SITE_COPYRIGHT_KEY, copyright)?;
        }
        Ok(())
    }
}
