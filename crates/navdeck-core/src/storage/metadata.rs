//! Ordered metadata storage

use crate::model::MetadataEntry;
use crate::storage::db::DatabaseError;
use rusqlite::{params, Connection};

/// Metadata storage operations
pub struct MetadataStore<'a> {
    conn: &'a Connection,
}

impl<'a> MetadataStore<'a> {
    /// Create a new metadata store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// List all pairs in insertion order
    ///
    /// # Errors
    /// Returns an error if the pairs cannot be listed
    pub fn find_many(&self) -> Result<Vec<MetadataEntry>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM metadata ORDER BY position")?;

        let rows = stmt.query_map([], |row| {
            Ok(MetadataEntry {
                key: row.get(0)?,
                value: row.get(1)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Append a pair after the existing ones
    ///
    /// # Errors
    /// Returns an error if the insert fails
    pub fn create(&self, entry: &MetadataEntry) -> Result<(), DatabaseError> {
        self.conn.execute(
            r"
            INSERT INTO metadata (position, key, value)
            VALUES ((SELECT COALESCE(MAX(position), 0) + 1 FROM metadata), ?1, ?2)
            ",
            params![entry.key, entry.value],
        )?;
        Ok(())
    }

    /// Delete every pair
    ///
    /// # Errors
    /// Returns an error if the delete fails
    pub fn delete_many(&self) -> Result<usize, DatabaseError> {
        Ok(self.conn.execute("DELETE FROM metadata", [])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn test_preserves_insertion_order() {
        let db = Database::in_memory().unwrap();
        let store = MetadataStore::new(db.connection());

        store.create(&MetadataEntry::new("zeta", "1")).unwrap();
        store.create(&MetadataEntry::new("alpha", "2")).unwrap();
        store.create(&MetadataEntry::new("zeta", "3")).unwrap();

        let keys: Vec<_> = store
            .find_many()
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "zeta"]);

        assert_eq!(store.delete_many().unwrap(), 3);
        assert!(store.find_many().unwrap().is_empty());
    }
}
