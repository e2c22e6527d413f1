//! Site storage operations

use crate::model::{Site, DEFAULT_CATEGORY_ID};
use crate::storage::db::DatabaseError;
use rusqlite::{params, Connection};

/// Site storage operations
pub struct SiteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SiteStore<'a> {
    /// Create a new site store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// List all sites ordered by category and display order
    ///
    /// # Errors
    /// Returns an error if the sites cannot be listed
    pub fn find_many(&self) -> Result<Vec<Site>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, title, url, description, icon, category_id, display_order
            FROM sites
            ORDER BY category_id, display_order, id
            ",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Site {
                id: row.get(0)?,
                title: row.get(1)?,
                url: row.get(2)?,
                description: row.get(3)?,
                icon: row.get(4)?,
                category_id: row.get(5)?,
                display_order: row.get(6)?,
            })
        })?;

        let mut sites = Vec::new();
        for row in rows {
            sites.push(row?);
        }
        Ok(sites)
    }

    /// Ids of every stored site
    ///
    /// # Errors
    /// Returns an error if the ids cannot be read
    pub fn ids(&self) -> Result<Vec<i64>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT id FROM sites ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    /// Insert a site
    ///
    /// # Errors
    /// Returns an error if the site cannot be created
    pub fn create(&self, site: &Site) -> Result<(), DatabaseError> {
        self.conn.execute(
            r"
            INSERT INTO sites (id, title, url, description, icon, category_id, display_order)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                site.id,
                site.title,
                site.url,
                site.description,
                site.icon,
                site.category_id,
                site.display_order,
            ],
        )?;
        Ok(())
    }

    /// Delete every site
    ///
    /// # Errors
    /// Returns an error if the delete fails
    pub fn delete_many(&self) -> Result<usize, DatabaseError> {
        Ok(self.conn.execute("DELETE FROM sites", [])?)
    }

    /// Move sites whose category no longer exists to the default category.
    ///
    /// Returns the number of sites that were moved.
    ///
    /// # Errors
    /// Returns an error if the update fails
    pub fn reassign_orphans(&self) -> Result<usize, DatabaseError> {
        let moved = self.conn.execute(
            r"
            UPDATE sites SET category_id = ?1
            WHERE category_id NOT IN (SELECT id FROM categories)
            ",
            params![DEFAULT_CATEGORY_ID],
        )?;
        Ok(moved)
    }
}
