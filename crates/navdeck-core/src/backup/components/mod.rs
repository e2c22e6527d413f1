//! Restorable components, one per slice of application state
//!
//! Every kind implements [`RestorableComponent`]; [`Component`] is the tagged
//! form the archive codec and the engine pass around.

pub mod category_data;
pub mod favicon;
pub mod metadata;
pub mod site_data;
pub mod site_icons;
pub mod site_settings;

use crate::backup::archive::{AttachmentReader, AttachmentWriter};
use crate::backup::error::{ArchiveError, BackupError, MalformedArchiveError, StoreFailure};
use crate::backup::types::{ComponentKind, RestoreOptions};
use crate::storage::{BlobJournal, BlobMeta, BlobStore};
use crate::util::sha256_hex;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use self::category_data::CategoryData;
use self::favicon::Favicon;
use self::metadata::MetadataList;
use self::site_data::SiteData;
use self::site_icons::SiteIconFiles;
use self::site_settings::SiteSettings;

/// Live state a component exports from
pub struct ExportContext<'a> {
    pub conn: &'a Connection,
    pub blobs: &'a dyn BlobStore,
}

/// Restore-time state shared by the components of one restore
pub struct ApplyContext<'a, 's> {
    /// Connection inside the restore transaction
    pub conn: &'a Connection,
    pub blobs: &'a mut BlobJournal<'s>,
    pub options: RestoreOptions,
    /// Category ids after the category step, if categories were restored
    pub valid_category_ids: Option<BTreeSet<i64>>,
    /// Sites whose category reference was rewritten to the default
    pub reassigned_sites: usize,
}

impl<'a, 's> ApplyContext<'a, 's> {
    pub fn new(
        conn: &'a Connection,
        blobs: &'a mut BlobJournal<'s>,
        options: RestoreOptions,
    ) -> Self {
        Self {
            conn,
            blobs,
            options,
            valid_category_ids: None,
            reassigned_sites: 0,
        }
    }
}

/// One independently serializable slice of state
pub trait RestorableComponent: Sized {
    const KIND: ComponentKind;

    /// Read this slice from the live store
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    fn export(ctx: &ExportContext<'_>) -> Result<Self, BackupError>;

    /// Decode a manifest payload, pulling attachments from `attachments`.
    ///
    /// A missing attachment leaves a hole instead of failing.
    ///
    /// # Errors
    /// Returns an error if the payload does not decode into this shape
    fn load(
        payload: &[u8],
        attachments: &mut dyn AttachmentReader,
    ) -> Result<Self, MalformedArchiveError>;

    /// Hand attachments to `attachments` and return the manifest payload
    ///
    /// # Errors
    /// Returns an error if an attachment or the payload cannot be written
    fn save(&self, attachments: &mut dyn AttachmentWriter) -> Result<Vec<u8>, ArchiveError>;

    /// Replace this slice of the live store with the component's state
    ///
    /// # Errors
    /// Returns an error if a store write fails
    fn apply(&self, ctx: &mut ApplyContext<'_, '_>) -> Result<(), StoreFailure>;

    /// Attachment paths referenced by the manifest but not loaded
    fn missing_attachments(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Tagged component of any kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    SiteSettings(SiteSettings),
    Metadata(MetadataList),
    Favicon(Favicon),
    CategoryData(CategoryData),
    SiteData(SiteData),
    SiteIconFiles(SiteIconFiles),
}

impl Component {
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::SiteSettings(_) => SiteSettings::KIND,
            Self::Metadata(_) => MetadataList::KIND,
            Self::Favicon(_) => Favicon::KIND,
            Self::CategoryData(_) => CategoryData::KIND,
            Self::SiteData(_) => SiteData::KIND,
            Self::SiteIconFiles(_) => SiteIconFiles::KIND,
        }
    }

    /// Export the component of `kind` from the live store
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn export(kind: ComponentKind, ctx: &ExportContext<'_>) -> Result<Self, BackupError> {
        Ok(match kind {
            ComponentKind::SiteSettings => Self::SiteSettings(SiteSettings::export(ctx)?),
            ComponentKind::Metadata => Self::Metadata(MetadataList::export(ctx)?),
            ComponentKind::Favicon => Self::Favicon(Favicon::export(ctx)?),
            ComponentKind::CategoryData => Self::CategoryData(CategoryData::export(ctx)?),
            ComponentKind::SiteData => Self::SiteData(SiteData::export(ctx)?),
            ComponentKind::SiteIconFiles => Self::SiteIconFiles(SiteIconFiles::export(ctx)?),
        })
    }

    /// Decode the component of `kind` from its manifest payload
    ///
    /// # Errors
    /// Returns an error if the payload is malformed
    pub fn load(
        kind: ComponentKind,
        payload: &[u8],
        attachments: &mut dyn AttachmentReader,
    ) -> Result<Self, MalformedArchiveError> {
        Ok(match kind {
            ComponentKind::SiteSettings => {
                Self::SiteSettings(SiteSettings::load(payload, attachments)?)
            }
            ComponentKind::Metadata => Self::Metadata(MetadataList::load(payload, attachments)?),
            ComponentKind::Favicon => Self::Favicon(Favicon::load(payload, attachments)?),
            ComponentKind::CategoryData => {
                Self::CategoryData(CategoryData::load(payload, attachments)?)
            }
            ComponentKind::SiteData => Self::SiteData(SiteData::load(payload, attachments)?),
            ComponentKind::SiteIconFiles => {
                Self::SiteIconFiles(SiteIconFiles::load(payload, attachments)?)
            }
        })
    }

    /// # Errors
    /// Returns an error if the component cannot be saved
    pub fn save(&self, attachments: &mut dyn AttachmentWriter) -> Result<Vec<u8>, ArchiveError> {
        match self {
            Self::SiteSettings(c) => c.save(attachments),
            Self::Metadata(c) => c.save(attachments),
            Self::Favicon(c) => c.save(attachments),
            Self::CategoryData(c) => c.save(attachments),
            Self::SiteData(c) => c.save(attachments),
            Self::SiteIconFiles(c) => c.save(attachments),
        }
    }

    /// # Errors
    /// Returns an error if a store write fails
    pub fn apply(&self, ctx: &mut ApplyContext<'_, '_>) -> Result<(), StoreFailure> {
        match self {
            Self::SiteSettings(c) => c.apply(ctx),
            Self::Metadata(c) => c.apply(ctx),
            Self::Favicon(c) => c.apply(ctx),
            Self::CategoryData(c) => c.apply(ctx),
            Self::SiteData(c) => c.apply(ctx),
            Self::SiteIconFiles(c) => c.apply(ctx),
        }
    }

    #[must_use]
    pub fn missing_attachments(&self) -> Vec<String> {
        match self {
            Self::Favicon(c) => c.missing_attachments(),
            Self::SiteIconFiles(c) => c.missing_attachments(),
            _ => Vec::new(),
        }
    }
}

/// Manifest description of one binary attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDescriptor {
    /// Archive entry holding the bytes
    pub path: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Hex SHA256 of the bytes; older archives may omit it
    #[serde(default)]
    pub sha256: Option<String>,
}

fn default_content_type() -> String {
    BlobMeta::default().content_type
}

fn default_extension() -> String {
    BlobMeta::default().extension
}

impl AttachmentDescriptor {
    #[must_use]
    pub fn new(path: String, meta: &BlobMeta, bytes: &[u8]) -> Self {
        Self {
            path,
            content_type: meta.content_type.clone(),
            extension: meta.extension.clone(),
            sha256: Some(sha256_hex(bytes)),
        }
    }

    #[must_use]
    pub fn meta(&self) -> BlobMeta {
        BlobMeta {
            content_type: self.content_type.clone(),
            extension: self.extension.clone(),
        }
    }

    /// Fetch and verify the attachment; `None` (with a warning) if it is
    /// missing or its digest does not match.
    pub fn fetch(&self, attachments: &mut dyn AttachmentReader) -> Option<Vec<u8>> {
        let bytes = match attachments.provide(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("{e}");
                return None;
            }
        };

        if let Some(expected) = &self.sha256 {
            let actual = sha256_hex(&bytes);
            if !actual.eq_ignore_ascii_case(expected) {
                tracing::warn!(
                    path = %self.path,
                    "Attachment digest mismatch: expected {expected}, got {actual}"
                );
                return None;
            }
        }

        Some(bytes)
    }
}

/// Decode a JSON manifest payload for `kind`
pub(crate) fn decode_payload<T: DeserializeOwned>(
    kind: ComponentKind,
    payload: &[u8],
) -> Result<T, MalformedArchiveError> {
    serde_json::from_slice(payload).map_err(|source| MalformedArchiveError { kind, source })
}

/// Encode a JSON manifest payload for `kind`
pub(crate) fn encode_payload<T: Serialize>(
    kind: ComponentKind,
    value: &T,
) -> Result<Vec<u8>, ArchiveError> {
    serde_json::to_vec_pretty(value).map_err(|source| ArchiveError::Encode { kind, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::archive::MemoryAttachments;

    #[test]
    fn test_fetch_rejects_digest_mismatch() {
        let mut attachments = MemoryAttachments::new();
        attachments.process("_assets/x", b"tampered").unwrap();

        let descriptor = AttachmentDescriptor::new(
            "_assets/x".to_string(),
            &BlobMeta::default(),
            b"original",
        );
        assert_eq!(descriptor.fetch(&mut attachments), None);
    }

    #[test]
    fn test_fetch_without_digest() {
        let mut attachments = MemoryAttachments::new();
        attachments.process("_assets/x", b"bytes").unwrap();

        let descriptor: AttachmentDescriptor =
            serde_json::from_str(r#"{"path": "_assets/x"}"#).unwrap();
        assert_eq!(descriptor.meta(), BlobMeta::default());
        assert_eq!(descriptor.fetch(&mut attachments), Some(b"bytes".to_vec()));
    }

    #[test]
    fn test_component_kind_matches_variant() {
        let component = Component::Metadata(MetadataList::default());
        assert_eq!(component.kind(), ComponentKind::Metadata);
        assert!(component.missing_attachments().is_empty());
    }
}
