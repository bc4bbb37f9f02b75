//! Pure query pipeline turning raw task snapshots into display views.
//!
//! # Responsibility
//! - Filter by category, order deterministically, derive header metrics.
//!
//! # Invariants
//! - No I/O; the current day is always passed in.

pub mod pipeline;
