//! Category domain model.
//!
//! # Invariants
//! - `name` is non-blank after trim.
//! - `color` is an opaque display token; core never interprets it.

use crate::model::task::ValidationError;
use serde::{Deserialize, Serialize};

/// Storage-assigned category identifier.
pub type CategoryId = i64;

/// Categories written into an empty store on first initialization.
pub const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("Work", "#FF6F61"),
    ("Home", "#6B5B95"),
    ("Shopping", "#88B04B"),
    ("Personal", "#F7CAC9"),
];

/// Persisted category row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub color: String,
}

/// Input for category creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyCategoryName);
        }
        Ok(())
    }

    pub fn defaults() -> Vec<Self> {
        DEFAULT_CATEGORIES
            .iter()
            .map(|(name, color)| Self::new(*name, *color))
            .collect()
    }
}
