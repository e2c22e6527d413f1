//! Database connection management

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use thiserror::Error;

use super::migrations;

/// Database errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;

        // WAL lets backups read while the admin UI writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Create an in-memory database (for testing)
    ///
    /// # Errors
    /// Returns an error if the database cannot be created
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the connection
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one immediate transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back otherwise,
    /// so readers never observe a partial set of writes.
    ///
    /// # Errors
    /// Returns the closure's error, or an error if the transaction cannot be
    /// started or committed
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(|e| E::from(DatabaseError::from(e)))?;

        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(|e| E::from(DatabaseError::from(e)))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!("Rollback failed: {rollback_err}");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_seeds_default_category() {
        let db = Database::in_memory().unwrap();
        let name: String = db
            .connection()
            .query_row("SELECT name FROM categories WHERE id = -1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(name, "Uncategorized");
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::in_memory().unwrap();

        let result: Result<(), DatabaseError> = db.transaction(|tx| {
            tx.execute(
                "INSERT INTO categories (id, name, display_order) VALUES (4, 'Tools', 1)",
                [],
            )?;
            Err(DatabaseError::Migration("boom".to_string()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_transaction_commits_on_ok() {
        let db = Database::in_memory().unwrap();

        db.transaction(|tx| -> Result<(), DatabaseError> {
            tx.execute(
                "INSERT INTO categories (id, name, display_order) VALUES (4, 'Tools', 1)",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}
