//! Key/value setting storage

use crate::storage::db::DatabaseError;
use rusqlite::{params, Connection, OptionalExtension};

/// Setting key for the navigation page title
pub const SITE_TITLE_KEY: &str = "site.title";

/// Setting key for the footer copyright line
pub const SITE_COPYRIGHT_KEY: &str = "site.copyright";

/// Key/value setting operations
pub struct SettingStore<'a> {
    conn: &'a Connection,
}

impl<'a> SettingStore<'a> {
    /// Create a new setting store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Read a single setting
    ///
    /// # Errors
    /// Returns an error if the query fails
    pub fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Read every setting whose key is in `keys`, in the same order
    ///
    /// # Errors
    /// Returns an error if a query fails
    pub fn find_many(&self, keys: &[&str]) -> Result<Vec<(String, String)>, DatabaseError> {
        let mut found = Vec::new();
        for key in keys {
            if let Some(value) = self.get(key)? {
                found.push(((*key).to_string(), value));
            }
        }
        Ok(found)
    }

    /// Insert a setting
    ///
    /// # Errors
    /// Returns an error if the key already exists or the insert fails
    pub fn create(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete the given settings
    ///
    /// # Errors
    /// Returns an error if the delete fails
    pub fn delete_many(&self, keys: &[&str]) -> Result<usize, DatabaseError> {
        let mut deleted = 0;
        for key in keys {
            deleted += self
                .conn
                .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn test_create_get_delete() {
        let db = Database::in_memory().unwrap();
        let store = SettingStore::new(db.connection());

        assert_eq!(store.get(SITE_TITLE_KEY).unwrap(), None);
        store.create(SITE_TITLE_KEY, "My Links").unwrap();
        assert_eq!(store.get(SITE_TITLE_KEY).unwrap().as_deref(), Some("My Links"));

        let found = store
            .find_many(&[SITE_TITLE_KEY, SITE_COPYRIGHT_KEY])
            .unwrap();
        assert_eq!(found, vec![(SITE_TITLE_KEY.to_string(), "My Links".to_string())]);

        assert_eq!(store.delete_many(&[SITE_TITLE_KEY, SITE_COPYRIGHT_KEY]).unwrap(), 1);
        assert_eq!(store.get(SITE_TITLE_KEY).unwrap(), None);
    }
}
