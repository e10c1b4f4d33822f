//! Node Registry
//!
//! The registry owns the static description of every node: its kind, the
//! default value of a cell, or the compute function of a computed. It holds
//! no current values, so a single node definition can be read through any
//! number of [`Store`](crate::Store)s, each with independent state.
//!
//! # Ownership
//!
//! Descriptors live in the registry only. Clients hold [`Cell`] and
//! [`Computed`] handles, which are plain copyable ids. Looking up an id that
//! was never registered here (or was unregistered) is a
//! [`StoreError::NotFound`].
//!
//! A process-wide registry is available through [`Registry::global`]; it is
//! what [`Cell::new`] and [`Computed::new`] register into.

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt};

use crate::error::{Result, StoreError};
use crate::graph::{NodeId, NodeKind};
use crate::reactive::{AnyValue, Cell, Computed, Handle, Read, Value};

pub(crate) type ComputeFn = Arc<dyn Fn(&Read) -> Result<AnyValue> + Send + Sync>;
pub(crate) type AsyncComputeFn =
    Arc<dyn Fn(Read) -> BoxFuture<'static, Result<AnyValue>> + Send + Sync>;
type EqFn = fn(&AnyValue, &AnyValue) -> bool;

/// What a node does when it is read.
pub(crate) enum NodeBody {
    Cell { default: AnyValue },
    Computed(ComputeFn),
    AsyncComputed(AsyncComputeFn),
}

/// Static metadata for one node.
pub struct NodeDescriptor {
    id: NodeId,
    name: Option<String>,
    value_type: &'static str,
    body: NodeBody,
    eq: EqFn,
}

impl NodeDescriptor {
    pub(crate) fn cell<T: Value>(name: Option<String>, default: T) -> Self {
        Self {
            id: NodeId::next(NodeKind::Cell),
            name,
            value_type: type_name::<T>(),
            body: NodeBody::Cell {
                default: Arc::new(default),
            },
            eq: erased_eq::<T>,
        }
    }

    pub(crate) fn computed<T, F>(name: Option<String>, compute: F) -> Self
    where
        T: Value,
        F: Fn(&Read) -> Result<T> + Send + Sync + 'static,
    {
        let compute: ComputeFn =
            Arc::new(move |read: &Read| compute(read).map(|value| Arc::new(value) as AnyValue));
        Self {
            id: NodeId::next(NodeKind::Computed),
            name,
            value_type: type_name::<T>(),
            body: NodeBody::Computed(compute),
            eq: erased_eq::<T>,
        }
    }

    pub(crate) fn async_computed<T, F, Fut>(name: Option<String>, compute: F) -> Self
    where
        T: Value,
        F: Fn(Read) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let compute: AsyncComputeFn = Arc::new(move |read: Read| {
            let pending = compute(read);
            async move { pending.await.map(|value| Arc::new(value) as AnyValue) }.boxed()
        });
        Self {
            id: NodeId::next(NodeKind::Computed),
            name,
            value_type: type_name::<T>(),
            body: NodeBody::AsyncComputed(compute),
            eq: erased_eq::<T>,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.id.kind()
    }

    /// Optional name given at registration, for diagnostics.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Rust type name of the node's value.
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    /// Whether reading this node requires [`Store::get_async`](crate::Store::get_async).
    pub fn is_async(&self) -> bool {
        matches!(self.body, NodeBody::AsyncComputed(_))
    }

    pub(crate) fn body(&self) -> &NodeBody {
        &self.body
    }

    /// Compare two values of this node's type.
    pub(crate) fn values_equal(&self, a: &AnyValue, b: &AnyValue) -> bool {
        (self.eq)(a, b)
    }
}

impl fmt::Debug for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("async", &self.is_async())
            .finish()
    }
}

fn erased_eq<T: Value>(a: &AnyValue, b: &AnyValue) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Registry of node descriptors, addressed by [`NodeId`].
#[derive(Default)]
pub struct Registry {
    nodes: DashMap<NodeId, Arc<NodeDescriptor>>,

    /// Bumped on every successful unregister.
    generation: AtomicU64,
}

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

impl Registry {
    /// Create an empty registry, isolated from the global one.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static Arc<Registry> {
        GLOBAL.get_or_init(|| Arc::new(Registry::new()))
    }

    /// Register a cell with the given default value.
    pub fn register_cell<T: Value>(&self, default: T) -> Cell<T> {
        Cell::from_id(self.insert(NodeDescriptor::cell(None, default)))
    }

    /// Register a synchronous computed. The function is not called here.
    pub fn register_computed<T, F>(&self, compute: F) -> Computed<T>
    where
        T: Value,
        F: Fn(&Read) -> Result<T> + Send + Sync + 'static,
    {
        Computed::from_id(self.insert(NodeDescriptor::computed(None, compute)))
    }

    /// Register an asynchronous computed. The function is not called here.
    pub fn register_async_computed<T, F, Fut>(&self, compute: F) -> Computed<T>
    where
        T: Value,
        F: Fn(Read) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Computed::from_id(self.insert(NodeDescriptor::async_computed(None, compute)))
    }

    pub(crate) fn insert(&self, descriptor: NodeDescriptor) -> NodeId {
        let id = descriptor.id();
        tracing::trace!(node = %id, value_type = descriptor.value_type(), "registered node");
        self.nodes.insert(id, Arc::new(descriptor));
        id
    }

    /// Look up a node's descriptor.
    ///
    /// The returned `Arc` is detached from the map, so no shard lock is held
    /// while the caller evaluates the node.
    pub fn lookup(&self, id: NodeId) -> Result<Arc<NodeDescriptor>> {
        self.nodes
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(StoreError::NotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Remove a node's metadata. Subsequent lookups fail with
    /// [`StoreError::NotFound`].
    pub fn unregister<H: Handle>(&self, handle: &H) -> Result<()> {
        let id = handle.id();
        match self.nodes.remove(&id) {
            Some(_) => {
                self.generation.fetch_add(1, Ordering::AcqRel);
                tracing::debug!(node = %id, "unregistered node");
                Ok(())
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    /// Counter that changes whenever a node is unregistered. Stores compare
    /// it to notice removals made through other stores.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup_cell() {
        let registry = Registry::new();
        let cell = registry.register_cell(7_i32);

        let descriptor = registry.lookup(cell.id()).unwrap();
        assert_eq!(descriptor.kind(), NodeKind::Cell);
        assert_eq!(descriptor.value_type(), "i32");
        assert!(!descriptor.is_async());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registering_a_computed_does_not_run_it() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let registry = Registry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let computed = registry.register_computed(move |_read| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(1_u8)
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            registry.lookup(computed.id()).unwrap().kind(),
            NodeKind::Computed
        );
    }

    #[test]
    fn unregister_makes_lookup_fail() {
        let registry = Registry::new();
        let cell = registry.register_cell(String::from("x"));
        assert_eq!(registry.generation(), 0);

        registry.unregister(&cell).unwrap();
        assert_eq!(registry.generation(), 1);
        assert!(!registry.contains(cell.id()));
        assert!(matches!(
            registry.lookup(cell.id()),
            Err(StoreError::NotFound(id)) if id == cell.id()
        ));
        assert!(registry.unregister(&cell).unwrap_err().is_not_found());
        assert_eq!(registry.generation(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn registries_are_isolated() {
        let first = Registry::new();
        let second = Registry::new();
        let cell = first.register_cell(1_u32);

        assert!(first.contains(cell.id()));
        assert!(!second.contains(cell.id()));
    }

    #[test]
    fn erased_equality_compares_typed_values() {
        let a: AnyValue = Arc::new(3_i64);
        let b: AnyValue = Arc::new(3_i64);
        let c: AnyValue = Arc::new(4_i64);
        let other: AnyValue = Arc::new("3");

        assert!(erased_eq::<i64>(&a, &b));
        assert!(!erased_eq::<i64>(&a, &c));
        assert!(!erased_eq::<i64>(&a, &other));
    }
}
