//! Domain records shared by the storage layer and backup payloads

use serde::{Deserialize, Serialize};

/// Reserved id of the "Uncategorized" category.
///
/// The row always exists; sites whose category disappears are moved here.
pub const DEFAULT_CATEGORY_ID: i64 = -1;

/// Display name used when the default category has to be recreated
pub const DEFAULT_CATEGORY_NAME: &str = "Uncategorized";

/// A category grouping sites on the navigation page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub display_order: i64,
}

impl Category {
    /// The built-in default category row
    #[must_use]
    pub fn default_category() -> Self {
        Self {
            id: DEFAULT_CATEGORY_ID,
            name: DEFAULT_CATEGORY_NAME.to_string(),
            display_order: 0,
        }
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_CATEGORY_ID
    }
}

/// A bookmarked site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: i64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Remote icon URL; uploaded icons live in the blob store instead
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "default_category_id")]
    pub category_id: i64,
    #[serde(default)]
    pub display_order: i64,
}

fn default_category_id() -> i64 {
    DEFAULT_CATEGORY_ID
}

/// One ordered metadata pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

impl MetadataEntry {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_defaults_to_uncategorized() {
        let site: Site =
            serde_json::from_str(r#"{"id": 1, "title": "Docs", "url": "https://docs.rs"}"#)
                .unwrap();
        assert_eq!(site.category_id, DEFAULT_CATEGORY_ID);
        assert_eq!(site.display_order, 0);
        assert!(site.icon.is_none());
    }

    #[test]
    fn test_category_uses_camel_case() {
        let json = serde_json::to_value(Category {
            id: 3,
            name: "Dev".to_string(),
            display_order: 2,
        })
        .unwrap();
        assert_eq!(json["displayOrder"], 2);
    }
}
