//! Caller-facing error taxonomy of the task store.

use crate::model::task::{TaskId, ValidationError};
use crate::recurrence::RecurrenceError;
use crate::repo::task_repo::{Entity, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by `TaskStore` operations. None are retried internally.
#[derive(Debug)]
pub enum StoreError {
    /// Persistence medium failed or returned corrupt rows.
    StorageFailure(RepoError),
    /// Referenced task/category does not exist.
    NotFound { entity: Entity, id: i64 },
    /// Caller precondition violated; nothing was written.
    ValidationFailure(ValidationError),
    /// Next occurrence could not be computed; nothing was written.
    Recurrence(RecurrenceError),
    /// Closing the original failed after the successor was inserted.
    /// The transaction was rolled back, so neither write is visible and no
    /// successor id exists to reconcile.
    PartialRollover {
        task_id: TaskId,
        cause: Box<RepoError>,
    },
    /// Store handle is gone or its connection lock was poisoned.
    Unavailable(&'static str),
}

impl StoreError {
    /// Short stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StorageFailure(_) => "storage_failure",
            Self::NotFound { .. } => "not_found",
            Self::ValidationFailure(_) => "validation_failure",
            Self::Recurrence(_) => "recurrence_failure",
            Self::PartialRollover { .. } => "partial_rollover",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageFailure(err) => write!(f, "storage failure: {err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::ValidationFailure(err) => write!(f, "validation failed: {err}"),
            Self::Recurrence(err) => write!(f, "{err}"),
            Self::PartialRollover { task_id, cause } => write!(
                f,
                "rollover of task {task_id} failed and was rolled back: {cause}"
            ),
            Self::Unavailable(reason) => write!(f, "task store unavailable: {reason}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageFailure(err) => Some(err),
            Self::ValidationFailure(err) => Some(err),
            Self::Recurrence(err) => Some(err),
            Self::PartialRollover { cause, .. } => Some(cause.as_ref()),
            Self::NotFound { .. } | Self::Unavailable(_) => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::ValidationFailure(err),
            RepoError::NotFound(entity, id) => Self::NotFound { entity, id },
            RepoError::RolloverInterrupted { task_id, cause } => {
                Self::PartialRollover { task_id, cause }
            }
            other => Self::StorageFailure(other),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::ValidationFailure(value)
    }
}

impl From<RecurrenceError> for StoreError {
    fn from(value: RecurrenceError) -> Self {
        Self::Recurrence(value)
    }
}

impl From<crate::db::DbError> for StoreError {
    fn from(value: crate::db::DbError) -> Self {
        Self::StorageFailure(RepoError::Db(value))
    }
}
