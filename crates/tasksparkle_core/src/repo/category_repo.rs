//! Category repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Categories are create/read only; there is no update or delete path.
//! - Default seeding runs only against an empty `categories` table.

use crate::model::category::{Category, CategoryId, NewCategory};
use crate::repo::task_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

/// Repository interface for category persistence.
pub trait CategoryRepository {
    fn create_category(&self, category: &NewCategory) -> RepoResult<CategoryId>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    /// Lists categories ordered by `id ASC`.
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
    /// Inserts `defaults` only when no category exists yet.
    ///
    /// Returns the number of rows inserted (0 when already populated).
    fn populate_if_empty(&self, defaults: &[NewCategory]) -> RepoResult<usize>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create_category(&self, category: &NewCategory) -> RepoResult<CategoryId> {
        insert_category(self.conn, category)
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color FROM categories WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_category_row(row)?));
        }
        Ok(None)
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color FROM categories ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn populate_if_empty(&self, defaults: &[NewCategory]) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM categories;", [], |row| {
            row.get(0)
        })?;
        if existing > 0 {
            return Ok(0);
        }

        for category in defaults {
            insert_category(&tx, category)?;
        }
        tx.commit()?;
        Ok(defaults.len())
    }
}

fn insert_category(conn: &Connection, category: &NewCategory) -> RepoResult<CategoryId> {
    category.validate()?;
    conn.execute(
        "INSERT INTO categories (name, color) VALUES (?1, ?2);",
        params![category.name.trim(), category.color.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    let id: CategoryId = row.get("id")?;
    let name: String = row.get("name")?;
    if name.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "blank name in categories.name (id={id})"
        )));
    }
    Ok(Category {
        id,
        name,
        color: row.get("color")?,
    })
}
