//! Store configuration.
//!
//! # Invariants
//! - A blank `TASKSPARKLE_DB_PATH` behaves as if it were unset.

use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "TASKSPARKLE_DB_PATH";
pub const DEFAULT_DB_FILE_NAME: &str = "tasksparkle.sqlite3";

/// Options for `TaskStore::open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database file; `None` resolves to `<temp_dir>/tasksparkle.sqlite3`.
    pub db_path: Option<PathBuf>,
    /// Seed the default categories when the store has none.
    pub seed_default_categories: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            seed_default_categories: true,
        }
    }
}

impl StoreConfig {
    pub fn with_db_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Reads `TASKSPARKLE_DB_PATH` from the environment.
    pub fn from_env() -> Self {
        Self {
            db_path: non_blank(std::env::var(DB_PATH_ENV).ok()).map(PathBuf::from),
            ..Self::default()
        }
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}
