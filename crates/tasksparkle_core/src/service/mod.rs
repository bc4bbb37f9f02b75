//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the caller-facing store API.
//! - Keep UI layers decoupled from storage details.

pub mod error;
pub mod task_store;
