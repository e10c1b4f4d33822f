//! Evaluation Context
//!
//! The accessor handed to compute functions. Reading a node through it does
//! two things: the node is recorded as a dependency of the computed being
//! evaluated, and the node's value is fetched through the same store.
//!
//! # Cycle detection
//!
//! Each accessor carries the chain of computeds currently being evaluated on
//! its behalf, outermost first. Entering a node that is already on the chain
//! is a circular dependency. The chain belongs to one evaluation and is
//! dropped with it, so it is released on every exit path (success, error or
//! panic), and two unrelated evaluations (for example two pending async
//! computeds) never see each other's chain.
//!
//! # Ownership
//!
//! An accessor holds its store weakly. A pending asynchronous evaluation is
//! owned by the store it runs in, so a strong handle here would keep a store
//! alive through its own in-flight table. Reads through an accessor that
//! outlived its store fail with [`StoreError::StoreDropped`].

use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexSet;
use parking_lot::Mutex;
use smallvec::SmallVec;

use super::store::{Store, StoreInner};
use super::{downcast, Handle};
use crate::error::{Result, StoreError};
use crate::graph::NodeId;

/// Chain of computeds under evaluation, outermost first.
pub(crate) type EvalPath = SmallVec<[NodeId; 8]>;

/// Extend `path` with `id`, failing if `id` is already on it.
pub(crate) fn enter(path: &[NodeId], id: NodeId) -> Result<EvalPath> {
    if let Some(start) = path.iter().position(|entry| *entry == id) {
        let cycle = path[start..]
            .iter()
            .copied()
            .chain(std::iter::once(id))
            .collect();
        return Err(StoreError::CircularDependency { id, cycle });
    }
    let mut next = EvalPath::from_slice(path);
    next.push(id);
    Ok(next)
}

/// Dependency-tracking accessor passed to compute functions.
///
/// Cloning is cheap and clones record into the same dependency set, so an
/// asynchronous compute function may move clones into spawned work.
#[derive(Clone)]
pub struct Read {
    store: Weak<StoreInner>,
    owner: NodeId,
    path: EvalPath,
    dependencies: Arc<Mutex<IndexSet<NodeId>>>,
}

impl Read {
    pub(crate) fn new(store: &Store, owner: NodeId, path: EvalPath) -> Self {
        Self {
            store: store.downgrade(),
            owner,
            path,
            dependencies: Arc::new(Mutex::new(IndexSet::new())),
        }
    }

    /// Read a node and record it as a dependency.
    ///
    /// Fails with [`StoreError::Suspended`] if the node is an asynchronous
    /// computed without a cached value; use [`get_async`](Self::get_async)
    /// from asynchronous computeds.
    pub fn get<H: Handle>(&self, handle: &H) -> Result<H::Value> {
        let store = self.store()?;
        let id = self.track(&store, handle.id());
        let value = store.read_node(id, &self.path)?;
        downcast(id, &value)
    }

    /// Read a node, awaiting asynchronous computeds, and record it as a
    /// dependency.
    pub async fn get_async<H: Handle>(&self, handle: &H) -> Result<H::Value> {
        // The store handle is a temporary so it is not held across the await.
        let (id, pending) = {
            let store = self.store()?;
            let id = self.track(&store, handle.id());
            (id, store.read_node_async(id, self.path.clone()))
        };
        let value = pending.await?;
        downcast(id, &value)
    }

    /// The computed being evaluated.
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Dependencies recorded so far, in first-read order.
    pub fn dependencies(&self) -> IndexSet<NodeId> {
        self.dependencies.lock().clone()
    }

    /// The edge is linked before the dependency is read so that a write
    /// landing between the read and the end of evaluation still evicts the
    /// owner.
    fn track(&self, store: &Store, id: NodeId) -> NodeId {
        if self.dependencies.lock().insert(id) {
            store.link(id, self.owner);
        }
        id
    }

    fn store(&self) -> Result<Store> {
        Store::upgrade(&self.store).ok_or(StoreError::StoreDropped)
    }
}

impl fmt::Debug for Read {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Read")
            .field("owner", &self.owner)
            .field("path", &self.path)
            .field("dependencies", &*self.dependencies.lock())
            .finish()
    }
}
