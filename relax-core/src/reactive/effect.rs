//! Effect Implementation
//!
//! An Effect is a callback that runs whenever the node it is subscribed to
//! changes in a given store.
//!
//! # How Effects Work
//!
//! 1. [`Store::effect`](super::Store::effect) adds the effect to the node's
//!    subscriber set.
//!
//! 2. A successful write to the node (or, for computeds, a recomputation that
//!    produced a different value) invokes every subscriber synchronously, in
//!    subscription order, with a [`Change`].
//!
//! 3. The returned [`Unsubscribe`] removes that subscription.
//!
//! # Identity
//!
//! An `Effect` is reference-counted. Clones share the same identity, and a
//! node's subscriber set holds each identity at most once: subscribing the
//! same effect twice does not make it fire twice. This is also what
//! [`Store::clear_effect`](super::Store::clear_effect) matches on.

use std::fmt;
use std::sync::{Arc, Weak};

use super::store::StoreInner;
use super::subscriber::{Notify, SubscriberId};
use super::{AnyValue, Value};
use crate::graph::NodeId;

/// Old and new value delivered to an effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Change<T> {
    pub old_value: T,
    pub new_value: T,
}

/// A change callback for nodes producing `T`.
///
/// # Example
///
/// ```rust
/// use relax_core::{Cell, Change, Effect, Store};
///
/// let count = Cell::new(0_i32);
/// let store = Store::new();
/// let log = Effect::new(|change: &Change<i32>| {
///     println!("{} -> {}", change.old_value, change.new_value);
/// });
///
/// let off = store.effect(&count, &log);
/// store.set(&count, 5).unwrap(); // prints "0 -> 5"
/// off.unsubscribe();
/// store.set(&count, 6).unwrap(); // prints nothing
/// ```
pub struct Effect<T> {
    callback: Arc<dyn Fn(&Change<T>) + Send + Sync>,
}

impl<T: Value> Effect<T> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Change<T>) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Identity shared by all clones of this effect.
    pub(crate) fn key(&self) -> usize {
        Arc::as_ptr(&self.callback) as *const () as usize
    }

    /// Erase the value type so the store can hold the callback.
    pub(crate) fn erase(&self) -> Notify {
        let callback = Arc::clone(&self.callback);
        Arc::new(move |old: &AnyValue, new: &AnyValue| {
            if let (Some(old), Some(new)) = (old.downcast_ref::<T>(), new.downcast_ref::<T>()) {
                callback(&Change {
                    old_value: old.clone(),
                    new_value: new.clone(),
                });
            }
        })
    }

    /// Whether two effects share an identity.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl<T> Clone for Effect<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> fmt::Debug for Effect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("refs", &Arc::strong_count(&self.callback))
            .finish()
    }
}

/// Removes one subscription when called.
///
/// Calling [`unsubscribe`](Self::unsubscribe) more than once is harmless, as
/// is calling it after the store was dropped. Dropping the handle does not
/// unsubscribe.
#[derive(Clone)]
pub struct Unsubscribe {
    store: Weak<StoreInner>,
    node: NodeId,
    subscriber: SubscriberId,
}

impl Unsubscribe {
    pub(crate) fn new(store: Weak<StoreInner>, node: NodeId, subscriber: SubscriberId) -> Self {
        Self {
            store,
            node,
            subscriber,
        }
    }

    /// Remove the subscription.
    pub fn unsubscribe(&self) {
        if let Some(store) = self.store.upgrade() {
            store.remove_subscriber(self.node, self.subscriber);
        }
    }

    /// The node this subscription watches.
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("node", &self.node)
            .field("subscriber", &self.subscriber)
            .finish()
    }
}
