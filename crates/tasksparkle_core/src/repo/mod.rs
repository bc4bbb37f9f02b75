//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from store orchestration.
//!
//! # Invariants
//! - Write paths validate before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod category_repo;
pub mod preference_repo;
pub mod task_repo;
