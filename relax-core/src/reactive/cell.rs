//! Cell Handles
//!
//! A Cell is the mutable leaf of the graph. The handle is only an id; the
//! current value of a cell is owned by each [`Store`](super::Store) that has
//! read or written it.
//!
//! # Example
//!
//! ```rust
//! use relax_core::{Cell, Store};
//!
//! let count = Cell::new(0_i32);
//! let store = Store::new();
//!
//! assert_eq!(store.get(&count).unwrap(), 0);
//! store.set(&count, 5).unwrap();
//! assert_eq!(store.get(&count).unwrap(), 5);
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::{Handle, Value};
use crate::graph::NodeId;
use crate::registry::{NodeDescriptor, Registry};

/// Handle to a mutable node holding a `T`.
///
/// Only cells can be written with [`Store::set`](super::Store::set).
pub struct Cell<T> {
    id: NodeId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Value> Cell<T> {
    /// Register a cell in the global registry.
    pub fn new(default: T) -> Self {
        Registry::global().register_cell(default)
    }

    /// Register a named cell in the global registry.
    pub fn named(name: impl Into<String>, default: T) -> Self {
        Self::from_id(Registry::global().insert(NodeDescriptor::cell(Some(name.into()), default)))
    }

    /// Register a cell in a specific registry.
    pub fn new_in(registry: &Registry, default: T) -> Self {
        registry.register_cell(default)
    }
}

impl<T> Cell<T> {
    pub(crate) fn from_id(id: NodeId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }
}

impl<T: Value> Handle for Cell<T> {
    type Value = T;

    fn id(&self) -> NodeId {
        self.id
    }
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cell<T> {}

impl<T> PartialEq for Cell<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Cell<T> {}

impl<T> Hash for Cell<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cell").field(&self.id).finish()
    }
}
