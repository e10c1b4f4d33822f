//! Reactive Primitives
//!
//! This module implements the reactive system: cells, computeds, effects and
//! the store that evaluates them.
//!
//! # Concepts
//!
//! ## Cells
//!
//! A [`Cell`] is a handle to a mutable value with a default. Reading a cell
//! that was never written through a store yields its default.
//!
//! ## Computeds
//!
//! A [`Computed`] is a handle to a derived value. Its function receives a
//! [`Read`] accessor; every node read through it becomes a dependency.
//! Results are cached per store and evicted, not recomputed, when a
//! dependency changes. The next read recomputes.
//!
//! ## Effects
//!
//! An [`Effect`] is a callback subscribed to one node of one store. It
//! receives the old and new value whenever that node changes.
//!
//! # Implementation Notes
//!
//! Handles carry no state. All values, subscriptions and dependency edges
//! live in a [`Store`], and node metadata lives in the
//! [`Registry`](crate::Registry). Dependency tracking is explicit: the
//! accessor passed to a compute function records what it reads, so no
//! thread-local tracking context is involved.

mod cell;
mod computed;
mod context;
mod effect;
mod store;
mod subscriber;

use std::any::Any;
use std::sync::Arc;

pub use cell::Cell;
pub use computed::Computed;
pub use context::Read;
pub use effect::{Change, Effect, Unsubscribe};
pub use store::Store;
pub use subscriber::SubscriberId;

use crate::error::{Result, StoreError};
use crate::graph::NodeId;

/// Bound for every value held by a node.
///
/// `PartialEq` drives the "unchanged write is a no-op" rule; `Clone` is how
/// values leave the store.
pub trait Value: Any + Clone + PartialEq + Send + Sync {}

impl<T> Value for T where T: Any + Clone + PartialEq + Send + Sync {}

/// Type-erased value as stored in a store's cache.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// A typed, copyable reference to a registered node.
pub trait Handle: Copy + Send + Sync + 'static {
    /// The type of value the node produces.
    type Value: Value;

    /// The node's id.
    fn id(&self) -> NodeId;
}

pub(crate) fn downcast<T: Value>(id: NodeId, value: &AnyValue) -> Result<T> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or(StoreError::TypeMismatch(id))
}
