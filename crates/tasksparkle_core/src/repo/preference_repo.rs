//! Opaque key-value preferences (active filter, scratch-pad text).
//!
//! Values are stored as text; interpretation belongs to callers.

use crate::repo::task_repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};

pub const ACTIVE_CATEGORY_FILTER_KEY: &str = "active_category_filter";
pub const SCRATCH_PAD_TEXT_KEY: &str = "scratch_pad_text";

/// Repository interface for preference persistence.
pub trait PreferenceRepository {
    fn get_preference(&self, key: &str) -> RepoResult<Option<String>>;
    fn set_preference(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Returns whether a value was removed.
    fn clear_preference(&self, key: &str) -> RepoResult<bool>;
}

/// SQLite-backed preference repository.
pub struct SqlitePreferenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePreferenceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PreferenceRepository for SqlitePreferenceRepository<'_> {
    fn get_preference(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_preference(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![key, value],
        )?;
        Ok(())
    }

    fn clear_preference(&self, key: &str) -> RepoResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM preferences WHERE key = ?1;", [key])?;
        Ok(removed > 0)
    }
}
