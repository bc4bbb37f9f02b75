//! Live queries: results that follow the latest committed collection state.
//!
//! # Invariants
//! - A result is recomputed only when the collection version (or the
//!   query's extra memo key) differs from the memoized entry.
//! - `changed` resolves only when the recomputed result differs from the
//!   last one handed out.
//! - Every value comes from one consistent snapshot tagged with the version
//!   it was read at.

use crate::service::error::StoreResult;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use tokio::sync::watch;

/// A value read at a given collection version.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

type Loader<K, T> = Box<dyn Fn(&K) -> StoreResult<Versioned<T>> + Send + Sync>;
type KeyFn<K> = Box<dyn Fn() -> K + Send + Sync>;

struct Memo<K, T> {
    version: u64,
    key: K,
    value: T,
}

/// Subscriber handle for one query over one collection.
pub struct LiveQuery<K, T> {
    versions: watch::Receiver<u64>,
    load: Loader<K, T>,
    key: KeyFn<K>,
    memo: Option<Memo<K, T>>,
}

impl<K, T> LiveQuery<K, T>
where
    K: PartialEq,
    T: Clone + PartialEq,
{
    /// `key` adds a memo dimension beyond the version (e.g. the local day).
    /// It is evaluated once per recomputation and handed to `load`, so a
    /// result is always memoized under the key it was built for.
    pub fn new(
        versions: watch::Receiver<u64>,
        load: impl Fn(&K) -> StoreResult<Versioned<T>> + Send + Sync + 'static,
        key: impl Fn() -> K + Send + Sync + 'static,
    ) -> Self {
        Self {
            versions,
            load: Box::new(load),
            key: Box::new(key),
            memo: None,
        }
    }

    /// Version of the last computed result, if any.
    pub fn version(&self) -> Option<u64> {
        self.memo.as_ref().map(|memo| memo.version)
    }

    /// Returns the latest result, recomputing only when stale.
    pub fn current(&mut self) -> StoreResult<T> {
        let latest = *self.versions.borrow_and_update();
        let key = (self.key)();
        if let Some(memo) = &self.memo {
            if memo.version >= latest && memo.key == key {
                return Ok(memo.value.clone());
            }
        }

        let fresh = (self.load)(&key)?;
        let value = fresh.value.clone();
        self.memo = Some(Memo {
            version: fresh.version,
            key,
            value: fresh.value,
        });
        Ok(value)
    }

    /// Waits for the next result that differs from the last one returned.
    ///
    /// Returns `None` once the owning store has been dropped.
    pub async fn changed(&mut self) -> Option<StoreResult<T>> {
        if self.memo.is_none() {
            return Some(self.current());
        }

        loop {
            if self.versions.changed().await.is_err() {
                return None;
            }
            let previous = self.memo.as_ref().map(|memo| memo.value.clone());
            match self.current() {
                Ok(value) if previous.as_ref() == Some(&value) => continue,
                other => return Some(other),
            }
        }
    }
}

/// Shared memo of derived results keyed by query input, valid for a single
/// collection version.
pub struct MemoCache<K, V> {
    entries: Mutex<HashMap<K, Versioned<V>>>,
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn get(&self, key: &K, version: u64) -> Option<V> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(key)
            .filter(|entry| entry.version == version)
            .map(|entry| entry.value.clone())
    }

    /// Stores a value; older versions for other keys are evicted.
    pub fn insert(&self, key: K, version: u64, value: V) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|_, entry| entry.version >= version);
            entries.insert(key, Versioned { version, value });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
