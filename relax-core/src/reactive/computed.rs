//! Computed Handles
//!
//! A Computed is a cached derived value that re-evaluates only when one of
//! its dependencies changes.
//!
//! # How Computeds Work
//!
//! 1. Registration stores the function; nothing runs.
//!
//! 2. The first read through a store runs the function and caches the result
//!    in that store.
//!
//! 3. Later reads return the cached value.
//!
//! 4. When a dependency changes, the cached value is evicted.
//!
//! 5. The next read recomputes.
//!
//! # Why This Matters
//!
//! Eviction instead of eager recomputation means a computed that nobody reads
//! after its inputs changed costs nothing, and no scheduler is needed to keep
//! caches consistent: a stale value is removed the moment a dependency write
//! is observed.

use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::{Handle, Read, Value};
use crate::error::Result;
use crate::graph::NodeId;
use crate::registry::{NodeDescriptor, Registry};

/// Handle to a derived node producing a `T`.
///
/// # Example
///
/// ```rust
/// use relax_core::{Cell, Computed, Store};
///
/// let a = Cell::new(1_i32);
/// let b = Cell::new(2_i32);
/// let sum = Computed::new(move |read| Ok(read.get(&a)? + read.get(&b)?));
///
/// let store = Store::new();
/// assert_eq!(store.get(&sum).unwrap(), 3);
/// store.set(&a, 5).unwrap();
/// assert_eq!(store.get(&sum).unwrap(), 7);
/// ```
pub struct Computed<T> {
    id: NodeId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Value> Computed<T> {
    /// Register a synchronous computed in the global registry.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn(&Read) -> Result<T> + Send + Sync + 'static,
    {
        Registry::global().register_computed(compute)
    }

    /// Register a named synchronous computed in the global registry.
    pub fn named<F>(name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&Read) -> Result<T> + Send + Sync + 'static,
    {
        Self::from_id(
            Registry::global().insert(NodeDescriptor::computed(Some(name.into()), compute)),
        )
    }

    /// Register a synchronous computed in a specific registry.
    pub fn new_in<F>(registry: &Registry, compute: F) -> Self
    where
        F: Fn(&Read) -> Result<T> + Send + Sync + 'static,
    {
        registry.register_computed(compute)
    }

    /// Register an asynchronous computed in the global registry.
    ///
    /// Asynchronous computeds are evaluated with
    /// [`Store::get_async`](super::Store::get_async); their dependencies are
    /// read with [`Read::get_async`].
    pub fn new_async<F, Fut>(compute: F) -> Self
    where
        F: Fn(Read) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Registry::global().register_async_computed(compute)
    }

    /// Register an asynchronous computed in a specific registry.
    pub fn new_async_in<F, Fut>(registry: &Registry, compute: F) -> Self
    where
        F: Fn(Read) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        registry.register_async_computed(compute)
    }
}

impl<T> Computed<T> {
    pub(crate) fn from_id(id: NodeId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }
}

impl<T: Value> Handle for Computed<T> {
    type Value = T;

    fn id(&self) -> NodeId {
        self.id
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Computed<T> {}

impl<T> PartialEq for Computed<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Computed<T> {}

impl<T> Hash for Computed<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Computed").field(&self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::graph::NodeKind;

    #[test]
    fn computed_handles_have_computed_ids() {
        let computed = Computed::new(|_read| Ok(42));
        assert_eq!(computed.id().kind(), NodeKind::Computed);

        let descriptor = Registry::global().lookup(computed.id()).unwrap();
        assert!(!descriptor.is_async());
    }

    #[test]
    fn async_computeds_are_flagged() {
        let computed = Computed::new_async(|_read| async { Ok::<_, StoreError>(String::from("later")) });
        let descriptor = Registry::global().lookup(computed.id()).unwrap();
        assert!(descriptor.is_async());
        assert_eq!(descriptor.kind(), NodeKind::Computed);
    }

    #[test]
    fn named_computeds_keep_their_name() {
        let computed = Computed::named("answer", |_read| Ok(42_u8));
        let descriptor = Registry::global().lookup(computed.id()).unwrap();
        assert_eq!(descriptor.name(), Some("answer"));
        assert_eq!(descriptor.value_type(), "u8");
    }
}
