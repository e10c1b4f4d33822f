//! Subscriber types for the reactive system.
//!
//! A subscriber is one effect callback registered on one node of one store.
//! Each node keeps its subscribers in a [`SubscriberTable`], an ordered set
//! keyed by callback identity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;

use super::AnyValue;

/// Unique identifier for a subscription.
///
/// Every successful subscription gets a fresh id, so an
/// [`Unsubscribe`](super::Unsubscribe) handle from an earlier subscription of
/// the same callback never removes a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased change callback: `(old, new)`.
pub(crate) type Notify = Arc<dyn Fn(&AnyValue, &AnyValue) + Send + Sync>;

/// A registered callback.
#[derive(Clone)]
pub(crate) struct Subscriber {
    id: SubscriberId,
    notify: Notify,
}

impl Subscriber {
    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    /// Invoke the callback with the old and new value.
    pub(crate) fn notify(&self, old: &AnyValue, new: &AnyValue) {
        (self.notify)(old, new);
    }
}

/// Ordered set of subscribers for one node.
///
/// Keys are callback identities; inserting a callback that is already present
/// keeps the original entry and its position.
#[derive(Default)]
pub(crate) struct SubscriberTable {
    entries: IndexMap<usize, Subscriber>,
}

impl SubscriberTable {
    /// Insert a callback under `key`, returning the id of its subscription.
    pub(crate) fn insert(&mut self, key: usize, notify: impl FnOnce() -> Notify) -> SubscriberId {
        self.entries
            .entry(key)
            .or_insert_with(|| Subscriber {
                id: SubscriberId::new(),
                notify: notify(),
            })
            .id
    }

    pub(crate) fn remove_key(&mut self, key: usize) -> bool {
        self.entries.shift_remove(&key).is_some()
    }

    pub(crate) fn remove_id(&mut self, id: SubscriberId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|_, subscriber| subscriber.id != id);
        self.entries.len() != before
    }

    pub(crate) fn contains_id(&self, id: SubscriberId) -> bool {
        self.entries.values().any(|subscriber| subscriber.id == id)
    }

    /// Subscribers in subscription order, detached from the table.
    pub(crate) fn snapshot(&self) -> Vec<Subscriber> {
        self.entries.values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
