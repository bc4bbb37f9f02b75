//! Core of the TaskSparkle task manager.
//! This crate is the single source of truth for task and category invariants.

pub mod config;
pub mod db;
pub mod live;
pub mod logging;
pub mod model;
pub mod query;
pub mod recurrence;
pub mod repo;
pub mod service;

pub use config::StoreConfig;
pub use live::feed::Collection;
pub use live::query::LiveQuery;
pub use logging::{default_log_level, init_logging, logging_status, LogSettings};
pub use model::category::{Category, CategoryId, NewCategory, DEFAULT_CATEGORIES};
pub use model::task::{NewTask, Priority, Recurrence, Task, TaskId, TaskPatch, ValidationError};
pub use query::pipeline::{
    build_task_view, compare_tasks, compute_metrics, CategoryFilter, TaskMetrics, TaskView,
};
pub use recurrence::{next_due_date, RecurrenceError};
pub use repo::task_repo::{Entity, RepoError, RepoResult};
pub use service::error::{StoreError, StoreResult};
pub use service::task_store::{CategoryWatch, TaskStore, TaskWatch, ToggleOutcome};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
