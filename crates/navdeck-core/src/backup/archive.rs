//! Zip archive codec for selective backups
//!
//! Each selected component is stored as one JSON manifest entry under its
//! fixed name (see [`ComponentKind::manifest_name`]). Binary attachments are
//! separate entries whose paths are recorded inside the owning manifest.

use crate::backup::components::Component;
use crate::backup::error::{ArchiveError, AttachmentMissingError, RestoreError};
use crate::backup::types::{BackupSelection, ComponentKind};
use crate::storage::BlobKey;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read, Write};
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Directory prefix for attachment entries
pub const ASSET_PREFIX: &str = "_assets";

/// Conventional archive path for the attachment backing `key`
#[must_use]
pub fn attachment_path(key: &BlobKey) -> String {
    format!("{ASSET_PREFIX}/{}", key.path())
}

/// Resolves attachment paths while a component loads
pub trait AttachmentReader {
    /// Bytes stored under `path`
    ///
    /// # Errors
    /// Returns an error if no entry exists at `path` or it cannot be read
    fn provide(&mut self, path: &str) -> Result<Vec<u8>, AttachmentMissingError>;
}

/// Receives attachments while a component saves
pub trait AttachmentWriter {
    /// Store `bytes` under `path`
    ///
    /// # Errors
    /// Returns an error if the entry cannot be written
    fn process(&mut self, path: &str, bytes: &[u8]) -> Result<(), ArchiveError>;
}

/// Path-keyed attachments held in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryAttachments {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryAttachments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.entries.remove(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AttachmentReader for MemoryAttachments {
    fn provide(&mut self, path: &str) -> Result<Vec<u8>, AttachmentMissingError> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| AttachmentMissingError::new(path, "no such entry"))
    }
}

impl AttachmentWriter for MemoryAttachments {
    fn process(&mut self, path: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        if self.entries.contains_key(path) {
            return Err(ArchiveError::DuplicateEntry(path.to_string()));
        }
        self.entries.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Read side of an opened zip archive
struct ZipEntries<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> ZipEntries<'a> {
    fn open(bytes: &'a [u8]) -> Result<Self, ArchiveError> {
        Ok(Self {
            archive: ZipArchive::new(Cursor::new(bytes))?,
        })
    }

    /// Entry contents, `None` if the entry does not exist
    fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(Some(buffer))
    }
}

impl AttachmentReader for ZipEntries<'_> {
    fn provide(&mut self, path: &str) -> Result<Vec<u8>, AttachmentMissingError> {
        match self.read(path) {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) => Err(AttachmentMissingError::new(path, "no such entry")),
            Err(e) => Err(AttachmentMissingError::new(path, e.to_string())),
        }
    }
}

/// Write side of a zip archive being built in memory
struct ZipEntryWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: FileOptions,
    written: BTreeSet<String>,
}

impl ZipEntryWriter {
    fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: FileOptions::default().compression_method(CompressionMethod::Deflated),
            written: BTreeSet::new(),
        }
    }

    fn add(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        if !self.written.insert(name.to_string()) {
            return Err(ArchiveError::DuplicateEntry(name.to_string()));
        }
        self.zip.start_file(name, self.options)?;
        self.zip.write_all(bytes)?;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, ArchiveError> {
        Ok(self.zip.finish()?.into_inner())
    }
}

impl AttachmentWriter for ZipEntryWriter {
    fn process(&mut self, path: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        self.add(path, bytes)
    }
}

/// Components recovered from an archive
#[derive(Debug, Default)]
pub struct DecodedArchive {
    /// Loaded components, keyed (and therefore ordered) by kind
    pub components: BTreeMap<ComponentKind, Component>,
    /// Selected kinds whose manifest entry was not in the archive
    pub absent: Vec<ComponentKind>,
}

/// Encode `components` into a zip archive, keeping only selected kinds
///
/// # Errors
/// Returns an error if a manifest cannot be encoded or the archive cannot be
/// written
pub fn encode(
    components: &BTreeMap<ComponentKind, Component>,
    selection: &BackupSelection,
) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ZipEntryWriter::new();

    for (kind, component) in components {
        if !selection.is_selected(*kind) {
            continue;
        }
        let payload = component.save(&mut writer)?;
        writer.add(kind.manifest_name(), &payload)?;
    }

    writer.finish()
}

/// Decode the selected components from a zip archive
///
/// Selected kinds without a manifest entry are reported in
/// [`DecodedArchive::absent`] rather than treated as errors.
///
/// # Errors
/// Returns an error if the archive cannot be opened or a selected manifest
/// is malformed
pub fn decode(bytes: &[u8], selection: &BackupSelection) -> Result<DecodedArchive, RestoreError> {
    let mut entries = ZipEntries::open(bytes)?;
    let mut decoded = DecodedArchive::default();

    for kind in selection.kinds() {
        let Some(payload) = entries.read(kind.manifest_name())? else {
            tracing::debug!(%kind, "No manifest entry in archive");
            decoded.absent.push(kind);
            continue;
        };
        let component = Component::load(kind, &payload, &mut entries)?;
        decoded.components.insert(kind, component);
    }

    Ok(decoded)
}

/// Entry listing of an archive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Component kinds with a manifest entry
    pub manifests: Vec<ComponentKind>,
    /// Every other entry with its uncompressed size
    pub attachments: Vec<(String, u64)>,
}

/// List the manifests and attachments of an archive without decoding them
///
/// # Errors
/// Returns an error if the archive cannot be opened
pub fn inspect(bytes: &[u8]) -> Result<ArchiveSummary, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut summary = ArchiveSummary::default();

    for index in 0..archive.len() {
        let file = archive.by_index(index)?;
        match ComponentKind::from_manifest_name(file.name()) {
            Some(kind) => summary.manifests.push(kind),
            None => summary
                .attachments
                .push((file.name().to_string(), file.size())),
        }
    }

    summary.manifests.sort();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::components::site_settings::SiteSettings;
    use crate::backup::error::RestoreError;

    fn raw_archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipEntryWriter::new();
        for (name, content) in entries {
            writer.add(name, content.as_bytes()).unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn test_attachment_path_convention() {
        assert_eq!(attachment_path(&BlobKey::SystemFavicon), "_assets/favicon/system");
        assert_eq!(attachment_path(&BlobKey::SiteIcon(7)), "_assets/favicon/site/7");
    }

    #[test]
    fn test_writer_rejects_duplicate_entries() {
        let mut writer = ZipEntryWriter::new();
        writer.process("_assets/a", b"1").unwrap();
        assert!(matches!(
            writer.process("_assets/a", b"2"),
            Err(ArchiveError::DuplicateEntry(_))
        ));
    }

    #[test]
    fn test_encode_skips_unselected_components() {
        let mut components = BTreeMap::new();
        components.insert(
            ComponentKind::SiteSettings,
            Component::SiteSettings(SiteSettings {
                title: Some("Links".to_string()),
                copyright: None,
            }),
        );

        let bytes = encode(&components, &BackupSelection::default()).unwrap();
        assert!(inspect(&bytes).unwrap().manifests.is_empty());

        let bytes = encode(&components, &BackupSelection::all()).unwrap();
        assert_eq!(
            inspect(&bytes).unwrap().manifests,
            vec![ComponentKind::SiteSettings]
        );
    }

    #[test]
    fn test_decode_reports_absent_kinds() {
        let bytes = raw_archive(&[("site-settings.json", r#"{"title": "Links"}"#)]);
        let selection = BackupSelection::only([ComponentKind::SiteSettings, ComponentKind::Metadata]);

        let decoded = decode(&bytes, &selection).unwrap();
        assert_eq!(decoded.absent, vec![ComponentKind::Metadata]);
        assert!(decoded.components.contains_key(&ComponentKind::SiteSettings));
    }

    #[test]
    fn test_decode_ignores_unselected_malformed_entry() {
        let bytes = raw_archive(&[("site-data.json", "not json")]);
        let selection = BackupSelection::only([ComponentKind::Metadata]);
        assert!(decode(&bytes, &selection).unwrap().components.is_empty());
    }

    #[test]
    fn test_decode_malformed_selected_entry() {
        let bytes = raw_archive(&[("site-data.json", r#"{"oops": 1}"#)]);
        let selection = BackupSelection::only([ComponentKind::SiteData]);
        let err = decode(&bytes, &selection).unwrap_err();
        assert!(matches!(err, RestoreError::Malformed(e) if e.kind == ComponentKind::SiteData));
    }

    #[test]
    fn test_decode_rejects_non_zip() {
        let err = decode(b"plain text", &BackupSelection::all()).unwrap_err();
        assert!(matches!(err, RestoreError::Archive(_)));
    }

    #[test]
    fn test_inspect_lists_attachments() {
        let bytes = raw_archive(&[
            ("favicon.json", "{}"),
            ("_assets/favicon/system", "icon"),
        ]);
        let summary = inspect(&bytes).unwrap();
        assert_eq!(summary.manifests, vec![ComponentKind::Favicon]);
        assert_eq!(
            summary.attachments,
            vec![("_assets/favicon/system".to_string(), 4)]
        );
    }
}
