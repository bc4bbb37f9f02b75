//! Reactive query layer.
//!
//! # Responsibility
//! - Publish a monotonic version per collection on every committed write.
//! - Let any number of subscribers follow derived results without manual
//!   re-fetching.
//!
//! # Invariants
//! - Bursts of writes may coalesce; the final delivered value always reflects
//!   the latest committed state.

pub mod feed;
pub mod query;
