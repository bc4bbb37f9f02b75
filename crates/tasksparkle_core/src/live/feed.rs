//! Per-collection change versions.
//!
//! # Invariants
//! - Versions are monotonic and start at 0.
//! - Each committed mutation bumps its collection exactly once.
//! - Publishing never fails, even with zero subscribers.

use tokio::sync::watch;

/// Watched entity collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Tasks,
    Categories,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Categories => "categories",
        }
    }
}

/// Version counters backed by `watch` channels; receivers only ever see the
/// latest version, so bursts of writes coalesce.
#[derive(Debug)]
pub struct ChangeFeed {
    tasks: watch::Sender<u64>,
    categories: watch::Sender<u64>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tasks, _) = watch::channel(0);
        let (categories, _) = watch::channel(0);
        Self { tasks, categories }
    }

    fn sender(&self, collection: Collection) -> &watch::Sender<u64> {
        match collection {
            Collection::Tasks => &self.tasks,
            Collection::Categories => &self.categories,
        }
    }

    /// Bumps the collection version and returns the new value.
    pub fn publish(&self, collection: Collection) -> u64 {
        let sender = self.sender(collection);
        sender.send_modify(|version| *version += 1);
        *sender.borrow()
    }

    pub fn version(&self, collection: Collection) -> u64 {
        *self.sender(collection).borrow()
    }

    pub fn subscribe(&self, collection: Collection) -> watch::Receiver<u64> {
        self.sender(collection).subscribe()
    }

    /// Number of live receivers for the collection.
    pub fn subscriber_count(&self, collection: Collection) -> usize {
        self.sender(collection).receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeFeed, Collection};

    #[test]
    fn publish_bumps_only_the_named_collection() {
        let feed = ChangeFeed::new();
        assert_eq!(feed.publish(Collection::Tasks), 1);
        assert_eq!(feed.publish(Collection::Tasks), 2);
        assert_eq!(feed.version(Collection::Tasks), 2);
        assert_eq!(feed.version(Collection::Categories), 0);
    }

    #[test]
    fn receivers_coalesce_to_latest_version() {
        let feed = ChangeFeed::new();
        let mut receiver = feed.subscribe(Collection::Tasks);
        assert_eq!(feed.subscriber_count(Collection::Tasks), 1);

        feed.publish(Collection::Tasks);
        feed.publish(Collection::Tasks);
        feed.publish(Collection::Tasks);

        assert!(receiver.has_changed().unwrap());
        assert_eq!(*receiver.borrow_and_update(), 3);
        assert!(!receiver.has_changed().unwrap());
    }
}
