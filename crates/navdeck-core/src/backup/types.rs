//! Selection, options and report types for backup/restore

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One independently serializable slice of application state.
///
/// Declaration order is the order in which a restore applies components:
/// categories must land before sites so the site step can repair category
/// references, and site icons come last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentKind {
    SiteSettings,
    Metadata,
    Favicon,
    CategoryData,
    SiteData,
    SiteIconFiles,
}

impl ComponentKind {
    /// Every kind, in restore order
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::SiteSettings,
        ComponentKind::Metadata,
        ComponentKind::Favicon,
        ComponentKind::CategoryData,
        ComponentKind::SiteData,
        ComponentKind::SiteIconFiles,
    ];

    /// Fixed archive entry holding this kind's manifest payload
    #[must_use]
    pub const fn manifest_name(self) -> &'static str {
        match self {
            Self::SiteSettings => "site-settings.json",
            Self::Metadata => "metadata.json",
            Self::Favicon => "favicon.json",
            Self::SiteData => "site-data.json",
            Self::CategoryData => "category-data.json",
            Self::SiteIconFiles => "site-icon-files.json",
        }
    }

    /// Reverse lookup of [`ComponentKind::manifest_name`]
    #[must_use]
    pub fn from_manifest_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.manifest_name() == name)
    }

    /// Short human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SiteSettings => "site settings",
            Self::Metadata => "metadata",
            Self::Favicon => "favicon",
            Self::SiteData => "site data",
            Self::CategoryData => "category data",
            Self::SiteIconFiles => "site icon files",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which component kinds take part in a backup or a restore.
///
/// Missing fields default to `false` and unknown fields are ignored, so a
/// selection posted by an older or newer client still deserializes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct BackupSelection {
    pub site_settings: bool,
    pub metadata: bool,
    pub favicon: bool,
    pub site_data: bool,
    pub category_data: bool,
    pub site_icon_files: bool,
}

impl BackupSelection {
    /// Select every component kind
    #[must_use]
    pub fn all() -> Self {
        Self::only(ComponentKind::ALL)
    }

    /// Select exactly the given kinds
    #[must_use]
    pub fn only(kinds: impl IntoIterator<Item = ComponentKind>) -> Self {
        let mut selection = Self::default();
        for kind in kinds {
            selection.set(kind, true);
        }
        selection
    }

    #[must_use]
    pub fn is_selected(&self, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::SiteSettings => self.site_settings,
            ComponentKind::Metadata => self.metadata,
            ComponentKind::Favicon => self.favicon,
            ComponentKind::SiteData => self.site_data,
            ComponentKind::CategoryData => self.category_data,
            ComponentKind::SiteIconFiles => self.site_icon_files,
        }
    }

    pub fn set(&mut self, kind: ComponentKind, selected: bool) {
        let flag = match kind {
            ComponentKind::SiteSettings => &mut self.site_settings,
            ComponentKind::Metadata => &mut self.metadata,
            ComponentKind::Favicon => &mut self.favicon,
            ComponentKind::SiteData => &mut self.site_data,
            ComponentKind::CategoryData => &mut self.category_data,
            ComponentKind::SiteIconFiles => &mut self.site_icon_files,
        };
        *flag = selected;
    }

    /// Selected kinds in restore order
    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        ComponentKind::ALL
            .into_iter()
            .filter(|kind| self.is_selected(*kind))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds().next().is_none()
    }
}

/// How site rows are checked when categories are not part of the restore
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategoryFallback {
    /// Keep a site's category if that category already exists in the store
    #[default]
    StoreCategories,
    /// Move every restored site to the default category
    DefaultOnly,
}

/// Restore tuning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RestoreOptions {
    pub category_fallback: CategoryFallback,
}

/// Outcome of a successful restore
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    /// Kinds written to the store, in the order they were applied
    pub applied: Vec<ComponentKind>,
    /// Selected kinds with no manifest entry in the archive
    pub absent: Vec<ComponentKind>,
    /// Attachment paths referenced by a manifest but missing or corrupt
    pub missing_attachments: Vec<String>,
    /// Sites moved to the default category because theirs did not exist
    pub reassigned_sites: usize,
}

impl RestoreReport {
    /// `true` when nothing in the store was touched
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }

    /// Whether cached site/category listings are stale after this restore
    #[must_use]
    pub fn invalidates_site_views(&self) -> bool {
        self.applied.iter().any(|kind| {
            matches!(
                kind,
                ComponentKind::SiteData
                    | ComponentKind::CategoryData
                    | ComponentKind::SiteIconFiles
            )
        })
    }
}

/// Suggested archive file name: `backup_<ISO8601 with ':' replaced by '-'>.zip`
#[must_use]
pub fn backup_filename(now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(':', "-");
    format!("backup_{stamp}.zip")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manifest_names_are_unique_and_reversible() {
        for kind in ComponentKind::ALL {
            assert_eq!(ComponentKind::from_manifest_name(kind.manifest_name()), Some(kind));
        }
        assert_eq!(ComponentKind::from_manifest_name("_assets/favicon/system"), None);
    }

    #[test]
    fn test_selection_missing_fields_default_false() {
        let selection: BackupSelection =
            serde_json::from_str(r#"{"siteData": true, "bogusFlag": true}"#).unwrap();
        assert_eq!(selection, BackupSelection::only([ComponentKind::SiteData]));
        assert_eq!(selection.kinds().collect::<Vec<_>>(), vec![ComponentKind::SiteData]);
    }

    #[test]
    fn test_selection_all_in_restore_order() {
        let kinds: Vec<_> = BackupSelection::all().kinds().collect();
        assert_eq!(kinds, ComponentKind::ALL.to_vec());
        assert!(BackupSelection::default().is_empty());
    }

    #[test]
    fn test_backup_filename() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(backup_filename(now), "backup_2026-03-04T05-06-07.000Z.zip");
    }

    #[test]
    fn test_report_invalidation() {
        let mut report = RestoreReport::default();
        assert!(report.is_noop());
        report.applied.push(ComponentKind::Metadata);
        assert!(!report.invalidates_site_views());
        report.applied.push(ComponentKind::CategoryData);
        assert!(report.invalidates_site_views());
    }
}
