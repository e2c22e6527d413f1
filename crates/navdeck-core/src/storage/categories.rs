//! Category storage operations

use crate::model::{Category, DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME};
use crate::storage::db::DatabaseError;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;

/// Category storage operations
pub struct CategoryStore<'a> {
    conn: &'a Connection,
}

impl<'a> CategoryStore<'a> {
    /// Create a new category store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// List all categories ordered for display
    ///
    /// # Errors
    /// Returns an error if the categories cannot be listed
    pub fn find_many(&self) -> Result<Vec<Category>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, name, display_order
            FROM categories
            ORDER BY display_order, id
            ",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                display_order: row.get(2)?,
            })
        })?;

        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }

    /// Insert a category
    ///
    /// # Errors
    /// Returns an error if the category cannot be created (e.g. duplicate id)
    pub fn create(&self, category: &Category) -> Result<(), DatabaseError> {
        self.conn.execute(
            r"
            INSERT INTO categories (id, name, display_order)
            VALUES (?1, ?2, ?3)
            ",
            params![category.id, category.name, category.display_order],
        )?;
        Ok(())
    }

    /// Delete categories, optionally sparing the default one
    ///
    /// # Errors
    /// Returns an error if the delete fails
    pub fn delete_many(&self, keep_default: bool) -> Result<usize, DatabaseError> {
        let deleted = if keep_default {
            self.conn.execute(
                "DELETE FROM categories WHERE id != ?1",
                params![DEFAULT_CATEGORY_ID],
            )?
        } else {
            self.conn.execute("DELETE FROM categories", [])?
        };
        Ok(deleted)
    }

    /// Ids of every stored category
    ///
    /// # Errors
    /// Returns an error if the ids cannot be read
    pub fn ids(&self) -> Result<BTreeSet<i64>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT id FROM categories")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;

        let mut ids = BTreeSet::new();
        for row in rows {
            ids.insert(row?);
        }
        Ok(ids)
    }

    /// Recreate the default category if it is missing.
    ///
    /// Returns `true` when the row had to be inserted.
    ///
    /// # Errors
    /// Returns an error if the insert fails
    pub fn ensure_default(&self) -> Result<bool, DatabaseError> {
        let inserted = self.conn.execute(
            r"
            INSERT OR IGNORE INTO categories (id, name, display_order)
            VALUES (?1, ?2, 0)
            ",
            params![DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME],
        )?;
        Ok(inserted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn category(id: i64, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            display_order: id,
        }
    }

    #[test]
    fn test_delete_many_keeps_default() {
        let db = Database::in_memory().unwrap();
        let store = CategoryStore::new(db.connection());
        store.create(&category(3, "Dev")).unwrap();
        store.create(&category(5, "News")).unwrap();

        assert_eq!(store.delete_many(true).unwrap(), 2);
        assert_eq!(store.ids().unwrap(), BTreeSet::from([DEFAULT_CATEGORY_ID]));
    }

    #[test]
    fn test_delete_all_then_ensure_default() {
        let db = Database::in_memory().unwrap();
        let store = CategoryStore::new(db.connection());

        store.delete_many(false).unwrap();
        assert!(store.ids().unwrap().is_empty());

        assert!(store.ensure_default().unwrap());
        assert!(!store.ensure_default().unwrap());
        assert_eq!(store.find_many().unwrap(), vec![Category::default_category()]);
    }

    #[test]
    fn test_create_duplicate_fails() {
        let db = Database::in_memory().unwrap();
        let store = CategoryStore::new(db.connection());
        store.create(&category(3, "Dev")).unwrap();
        assert!(store.create(&category(3, "Again")).is_err());
    }
}
