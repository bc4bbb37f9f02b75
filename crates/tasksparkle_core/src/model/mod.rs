//! Entity schema for tasks and categories.
//!
//! # Responsibility
//! - Define the persisted shapes used by store, pipeline and recurrence code.
//! - Own write-boundary validation for task and category input.
//!
//! # Invariants
//! - Ids are assigned by storage and never reused.
//! - A recurring task always carries a due date.

pub mod category;
pub mod task;
