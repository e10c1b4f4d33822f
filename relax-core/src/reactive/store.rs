//! Store
//!
//! The store is the central coordinator that connects cells, computeds and
//! effects. It owns current values, subscriptions and the dependency graph
//! for one logical session; node definitions come from a shared
//! [`Registry`].
//!
//! # How It Works
//!
//! 1. Reading a node returns its cached value if there is one.
//!
//! 2. Otherwise a cell materializes its default, and a computed runs its
//!    function with a [`Read`] accessor that records every node it reads.
//!
//! 3. After evaluation the computed's dependency set is swapped in by diff
//!    and its value is cached.
//!
//! 4. When a cell is written with a different value, the store:
//!    a. Stores the new value
//!    b. Evicts every transitive computed dependent
//!    c. Runs the cell's effects with the old and new value
//!    d. Recomputes evicted computeds that have subscribers and notifies
//!       them if their value changed (see [`StoreConfig::notify_computed`])
//!
//! # Thread Safety
//!
//! Store state sits behind a single mutex that is never held while user code
//! (compute functions, effects, plugins) runs or while an asynchronous
//! evaluation is awaited. A `Store` is a cheap `Arc` handle and can be shared
//! across threads and tasks.
//!
//! Pending asynchronous evaluations are owned by the store's in-flight table
//! and refer back to the store only weakly, so dropping the last `Store`
//! handle releases the store even while evaluations are pending.
//!
//! # Shared Registries
//!
//! Several stores may read one registry. When a node is unregistered through
//! any of them, every other store drops its state for the node and evicts its
//! dependents on that store's next top-level read.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, Weak};

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use indexmap::IndexSet;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, trace, warn};

use super::context::{enter, EvalPath, Read};
use super::effect::{Change, Effect, Unsubscribe};
use super::subscriber::{Subscriber, SubscriberId, SubscriberTable};
use super::{downcast, AnyValue, Cell, Handle, Value};
use crate::action::Plugin;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::graph::{DependencyGraph, NodeId};
use crate::registry::{AsyncComputeFn, ComputeFn, NodeBody, NodeDescriptor, Registry};

type SharedEval = Shared<BoxFuture<'static, Result<AnyValue>>>;
type PendingRead = BoxFuture<'static, Result<AnyValue>>;

/// A pending asynchronous evaluation, shared by every reader.
struct InFlight {
    epoch: u64,
    future: SharedEval,
}

#[derive(Default)]
struct StoreState {
    /// Materialized values. Absent means "not computed yet" for computeds and
    /// "use the default" for cells.
    values: HashMap<NodeId, AnyValue>,

    subscribers: HashMap<NodeId, SubscriberTable>,

    graph: DependencyGraph,

    /// Bumped whenever a computed is evicted. An evaluation only caches its
    /// result if the epoch it started with is still current.
    epochs: HashMap<NodeId, u64>,

    in_flight: HashMap<NodeId, InFlight>,

    /// Registry generation this store last reconciled against.
    registry_generation: u64,
}

impl StoreState {
    fn epoch(&self, id: NodeId) -> u64 {
        self.epochs.get(&id).copied().unwrap_or(0)
    }

    /// Evict every transitive dependent of `source`.
    ///
    /// Returns the evicted nodes that had a cached value, with that value, in
    /// topological order.
    fn invalidate_dependents(&mut self, source: NodeId) -> Vec<(NodeId, AnyValue)> {
        let mut evicted = Vec::new();
        for id in self.graph.affected_by(source) {
            *self.epochs.entry(id).or_default() += 1;
            self.in_flight.remove(&id);
            if let Some(previous) = self.values.remove(&id) {
                evicted.push((id, previous));
            }
        }
        evicted
    }

    /// Drop everything this store knows about `id`.
    fn forget(&mut self, id: NodeId) {
        self.values.remove(&id);
        self.subscribers.remove(&id);
        self.in_flight.remove(&id);
        self.graph.remove_node(id);
        *self.epochs.entry(id).or_default() += 1;
    }

    /// Every node this store holds any state for.
    fn known_nodes(&self) -> HashSet<NodeId> {
        self.values
            .keys()
            .chain(self.subscribers.keys())
            .chain(self.in_flight.keys())
            .copied()
            .chain(self.graph.node_ids())
            .collect()
    }

    fn has_subscribers(&self, id: NodeId) -> bool {
        self.subscribers
            .get(&id)
            .is_some_and(|table| !table.is_empty())
    }

    fn subscribers(&self, id: NodeId) -> Vec<Subscriber> {
        self.subscribers
            .get(&id)
            .map(SubscriberTable::snapshot)
            .unwrap_or_default()
    }
}

pub(crate) struct StoreInner {
    registry: Arc<Registry>,
    config: StoreConfig,
    state: Mutex<StoreState>,
    plugins: RwLock<Vec<Arc<dyn Plugin>>>,
}

impl StoreInner {
    pub(crate) fn remove_subscriber(&self, node: NodeId, subscriber: SubscriberId) {
        let mut state = self.state.lock();
        if let Some(table) = state.subscribers.get_mut(&node) {
            if table.remove_id(subscriber) {
                trace!(node = %node, ?subscriber, "unsubscribed");
            }
            if table.is_empty() {
                state.subscribers.remove(&node);
            }
        }
    }
}

/// Per-session cache of values, subscriptions and dependency edges.
///
/// # Example
///
/// ```rust
/// use relax_core::{Cell, Computed, Store};
///
/// let counter = Cell::new(0_i32);
/// let doubled = Computed::new(move |read| Ok(read.get(&counter)? * 2));
///
/// let store = Store::new();
/// assert_eq!(store.get(&doubled).unwrap(), 0);
/// store.set(&counter, 5).unwrap();
/// assert_eq!(store.get(&doubled).unwrap(), 10);
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create a store over the global registry with the default config.
    pub fn new() -> Self {
        Self::with_config(Arc::clone(Registry::global()), StoreConfig::default())
    }

    /// Create a store over a specific registry.
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        Self::with_config(registry, StoreConfig::default())
    }

    pub fn with_config(registry: Arc<Registry>, config: StoreConfig) -> Self {
        let state = StoreState {
            registry_generation: registry.generation(),
            ..StoreState::default()
        };
        Self {
            inner: Arc::new(StoreInner {
                registry,
                config,
                state: Mutex::new(state),
                plugins: RwLock::new(Vec::new()),
            }),
        }
    }

    /// A process-wide store over the global registry.
    ///
    /// Prefer passing an explicit store; state written here is visible to
    /// every caller in the process.
    pub fn global() -> &'static Store {
        static GLOBAL: OnceLock<Store> = OnceLock::new();
        GLOBAL.get_or_init(Store::new)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Read a node's current value.
    ///
    /// Fails with [`StoreError::NotFound`] for handles unknown to this
    /// store's registry, [`StoreError::CircularDependency`] if a computed
    /// reaches itself, [`StoreError::Suspended`] for an asynchronous computed
    /// without a cached value, and with whatever error a compute function
    /// returned.
    pub fn get<H: Handle>(&self, handle: &H) -> Result<H::Value> {
        let id = handle.id();
        self.reconcile();
        let value = self.read_node(id, &[])?;
        downcast(id, &value)
    }

    /// Read a node's current value, evaluating asynchronous computeds.
    ///
    /// Concurrent calls for the same pending computed share one evaluation.
    pub async fn get_async<H: Handle>(&self, handle: &H) -> Result<H::Value> {
        let id = handle.id();
        self.reconcile();
        let value = self.read_node_async(id, EvalPath::new()).await?;
        downcast(id, &value)
    }

    /// Write a cell.
    ///
    /// Writing a value equal to the current one does nothing: no cache write,
    /// no eviction, no effects.
    ///
    /// Once the value is stored the write has succeeded. A subscribed
    /// computed that fails to recompute afterwards is logged and left
    /// evicted, so its next read reports the error.
    pub fn set<T: Value>(&self, cell: &Cell<T>, value: T) -> Result<()> {
        let id = cell.id();
        let current = self.get(cell)?;
        if current == value {
            trace!(node = %id, "write skipped, value unchanged");
            return Ok(());
        }
        self.write(id, Arc::new(current), Arc::new(value))
    }

    /// Write a cell with a value derived from its current one.
    pub fn update<T, F>(&self, cell: &Cell<T>, f: F) -> Result<()>
    where
        T: Value,
        F: FnOnce(&T) -> T,
    {
        let current = self.get(cell)?;
        self.set(cell, f(&current))
    }

    /// Subscribe an effect to a node.
    ///
    /// Subscribing an effect that is already subscribed to the node returns a
    /// handle to the existing subscription; it still fires once per change.
    pub fn effect<H: Handle>(&self, handle: &H, effect: &Effect<H::Value>) -> Unsubscribe {
        let node = handle.id();
        let subscriber = self
            .inner
            .state
            .lock()
            .subscribers
            .entry(node)
            .or_default()
            .insert(effect.key(), || effect.erase());
        trace!(node = %node, ?subscriber, "subscribed");
        Unsubscribe::new(Arc::downgrade(&self.inner), node, subscriber)
    }

    /// Subscribe a closure to a node.
    pub fn subscribe<H, F>(&self, handle: &H, callback: F) -> Unsubscribe
    where
        H: Handle,
        F: Fn(&Change<H::Value>) + Send + Sync + 'static,
    {
        self.effect(handle, &Effect::new(callback))
    }

    /// Remove an effect from a node. Does nothing if it is not subscribed.
    pub fn clear_effect<H: Handle>(&self, handle: &H, effect: &Effect<H::Value>) {
        let node = handle.id();
        let mut state = self.inner.state.lock();
        if let Some(table) = state.subscribers.get_mut(&node) {
            table.remove_key(effect.key());
            if table.is_empty() {
                state.subscribers.remove(&node);
            }
        }
    }

    /// Unregister a node from the registry and drop this store's state for
    /// it. Computeds that depended on it are evicted.
    ///
    /// Other stores over the same registry catch up on their next read; see
    /// [Shared Registries](self#shared-registries).
    pub fn dispose<H: Handle>(&self, handle: &H) -> Result<()> {
        let id = handle.id();
        self.inner.registry.unregister(handle)?;
        let mut state = self.inner.state.lock();
        let evicted = state.invalidate_dependents(id);
        state.forget(id);
        debug!(node = %id, evicted = evicted.len(), "disposed node");
        Ok(())
    }

    /// Whether this store currently holds a materialized value for the node.
    pub fn is_cached<H: Handle>(&self, handle: &H) -> bool {
        self.inner.state.lock().values.contains_key(&handle.id())
    }

    pub fn subscriber_count<H: Handle>(&self, handle: &H) -> usize {
        self.inner
            .state
            .lock()
            .subscribers
            .get(&handle.id())
            .map_or(0, SubscriberTable::len)
    }

    /// Dependencies recorded by the node's last evaluation in this store.
    pub fn dependencies<H: Handle>(&self, handle: &H) -> Vec<NodeId> {
        self.inner.state.lock().graph.dependencies(handle.id())
    }

    /// Computeds whose last evaluation in this store read the node.
    pub fn dependents<H: Handle>(&self, handle: &H) -> Vec<NodeId> {
        self.inner.state.lock().graph.dependents(handle.id())
    }

    /// Add a store-level plugin, run for every action dispatched on this
    /// store before the action's own plugins.
    pub fn use_plugin(&self, plugin: Arc<dyn Plugin>) {
        self.inner.plugins.write().push(plugin);
    }

    /// Remove every store-level plugin with the given name.
    pub fn remove_plugin(&self, name: &str) -> bool {
        let mut plugins = self.inner.plugins.write();
        let before = plugins.len();
        plugins.retain(|plugin| plugin.name() != Some(name));
        plugins.len() != before
    }

    pub fn clear_plugins(&self) {
        self.inner.plugins.write().clear();
    }

    pub fn plugins(&self) -> Vec<Arc<dyn Plugin>> {
        self.inner.plugins.read().clone()
    }

    pub(crate) fn downgrade(&self) -> Weak<StoreInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<StoreInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    // ------------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------------

    /// Drop state for nodes unregistered since the last reconciliation,
    /// including through other stores sharing the registry.
    fn reconcile(&self) {
        let generation = self.inner.registry.generation();
        let mut state = self.inner.state.lock();
        if state.registry_generation == generation {
            return;
        }
        state.registry_generation = generation;

        let gone: Vec<NodeId> = state
            .known_nodes()
            .into_iter()
            .filter(|id| !self.inner.registry.contains(*id))
            .collect();
        for id in &gone {
            state.invalidate_dependents(*id);
            state.forget(*id);
        }
        if !gone.is_empty() {
            debug!(dropped = gone.len(), generation, "reconciled with registry");
        }
    }

    pub(crate) fn read_node(&self, id: NodeId, path: &[NodeId]) -> Result<AnyValue> {
        let descriptor = self.resolve(id)?;
        if let Some(value) = self.cached(id) {
            return Ok(value);
        }
        match descriptor.body() {
            NodeBody::Cell { default } => Ok(self.materialize(id, default)),
            NodeBody::Computed(compute) => self.evaluate(id, compute, path),
            NodeBody::AsyncComputed(_) => {
                enter(path, id)?;
                Err(StoreError::Suspended(id))
            }
        }
    }

    /// Start reading a node, returning a future for the value.
    ///
    /// Everything but awaiting a pending evaluation happens before this
    /// returns, so the future holds no store handle.
    pub(crate) fn read_node_async(
        &self,
        id: NodeId,
        path: EvalPath,
    ) -> PendingRead {
        let outcome = self.resolve(id).and_then(|descriptor| -> Result<PendingRead> {
            if let Some(value) = self.cached(id) {
                return Ok(future::ready(Ok(value)).boxed());
            }
            match descriptor.body() {
                NodeBody::Cell { default } => {
                    Ok(future::ready(Ok(self.materialize(id, default))).boxed())
                }
                NodeBody::Computed(compute) => {
                    Ok(future::ready(self.evaluate(id, compute, &path)).boxed())
                }
                NodeBody::AsyncComputed(compute) => {
                    Ok(self.evaluate_async(id, compute, &path)?.boxed())
                }
            }
        });
        outcome.unwrap_or_else(|err| future::ready(Err(err)).boxed())
    }

    /// Record that `dependent` read `dependency` during its current
    /// evaluation.
    pub(crate) fn link(&self, dependency: NodeId, dependent: NodeId) {
        self.inner.state.lock().graph.add_edge(dependency, dependent);
    }

    fn resolve(&self, id: NodeId) -> Result<Arc<NodeDescriptor>> {
        self.inner.registry.lookup(id).map_err(|err| {
            let mut state = self.inner.state.lock();
            state.invalidate_dependents(id);
            state.forget(id);
            err
        })
    }

    fn cached(&self, id: NodeId) -> Option<AnyValue> {
        let value = self.inner.state.lock().values.get(&id).cloned();
        if value.is_some() {
            trace!(node = %id, "cache hit");
        }
        value
    }

    fn materialize(&self, id: NodeId, default: &AnyValue) -> AnyValue {
        Arc::clone(
            self.inner
                .state
                .lock()
                .values
                .entry(id)
                .or_insert_with(|| Arc::clone(default)),
        )
    }

    fn evaluate(&self, id: NodeId, compute: &ComputeFn, path: &[NodeId]) -> Result<AnyValue> {
        let path = enter(path, id)?;
        let epoch = self.inner.state.lock().epoch(id);
        let read = Read::new(self, id, path);
        let result = compute(&read);
        self.finish(id, epoch, &read.dependencies(), result)
    }

    fn evaluate_async(
        &self,
        id: NodeId,
        compute: &AsyncComputeFn,
        path: &[NodeId],
    ) -> Result<SharedEval> {
        let path = enter(path, id)?;
        let mut state = self.inner.state.lock();
        let epoch = state.epoch(id);
        if let Some(flight) = state.in_flight.get(&id) {
            if flight.epoch == epoch {
                trace!(node = %id, "joining in-flight evaluation");
                return Ok(flight.future.clone());
            }
        }

        let read = Read::new(self, id, path);
        let compute = Arc::clone(compute);
        let store = self.downgrade();
        let future = async move {
            let result = compute(read.clone()).await;
            match Store::upgrade(&store) {
                Some(store) => store.finish(id, epoch, &read.dependencies(), result),
                None => result,
            }
        }
        .boxed()
        .shared();

        state.in_flight.insert(
            id,
            InFlight {
                epoch,
                future: future.clone(),
            },
        );
        Ok(future)
    }

    /// Commit the outcome of an evaluation that started at `epoch`.
    fn finish(
        &self,
        id: NodeId,
        epoch: u64,
        dependencies: &IndexSet<NodeId>,
        result: Result<AnyValue>,
    ) -> Result<AnyValue> {
        let registered = self.inner.registry.contains(id);
        let mut state = self.inner.state.lock();
        if state
            .in_flight
            .get(&id)
            .is_some_and(|flight| flight.epoch == epoch)
        {
            state.in_flight.remove(&id);
        }

        if !registered {
            state.graph.remove_node(id);
            state.values.remove(&id);
            debug!(node = %id, "node disposed during evaluation, result dropped");
            return result;
        }

        let diff = state.graph.replace_dependencies(id, dependencies);
        let value = result?;
        if state.epoch(id) == epoch {
            state.values.insert(id, Arc::clone(&value));
            debug!(
                node = %id,
                dependencies = dependencies.len(),
                added = diff.added.len(),
                removed = diff.removed.len(),
                "computed evaluated"
            );
        } else {
            warn!(node = %id, "dependency changed during evaluation, result not cached");
        }
        Ok(value)
    }

    // ------------------------------------------------------------------------
    // Notification
    // ------------------------------------------------------------------------

    fn write(&self, id: NodeId, old: AnyValue, new: AnyValue) -> Result<()> {
        let (subscribers, stale) = {
            let mut state = self.inner.state.lock();
            state.values.insert(id, Arc::clone(&new));
            let evicted = state.invalidate_dependents(id);
            debug!(node = %id, evicted = evicted.len(), "cell written");

            let stale: Vec<_> = if self.inner.config.notify_computed {
                evicted
                    .into_iter()
                    .filter(|(dependent, _)| state.has_subscribers(*dependent))
                    .collect()
            } else {
                Vec::new()
            };
            (state.subscribers(id), stale)
        };

        self.dispatch(id, &subscribers, &old, &new);
        for (dependent, previous) in stale {
            self.refresh(dependent, previous);
        }
        Ok(())
    }

    /// Recompute an evicted computed for its subscribers.
    ///
    /// A failed recompute caches nothing, so the node stays evicted and its
    /// next read reports the error.
    fn refresh(&self, id: NodeId, previous: AnyValue) {
        let Ok(descriptor) = self.inner.registry.lookup(id) else {
            return;
        };
        if descriptor.is_async() {
            debug!(node = %id, "async computed left lazy");
            return;
        }
        if !self.inner.state.lock().has_subscribers(id) {
            return;
        }

        let next = match self.read_node(id, &[]) {
            Ok(next) => next,
            Err(error) => {
                warn!(node = %id, %error, "recompute after write failed");
                return;
            }
        };
        if descriptor.values_equal(&previous, &next) {
            trace!(node = %id, "recomputed value unchanged");
            return;
        }
        let subscribers = self.inner.state.lock().subscribers(id);
        self.dispatch(id, &subscribers, &previous, &next);
    }

    fn dispatch(&self, id: NodeId, subscribers: &[Subscriber], old: &AnyValue, new: &AnyValue) {
        for subscriber in subscribers {
            // An earlier effect in this round may have unsubscribed it.
            if !self.is_subscribed(id, subscriber.id()) {
                continue;
            }
            if self.inner.config.isolate_effects {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber.notify(old, new)));
                if let Err(payload) = outcome {
                    error!(
                        node = %id,
                        subscriber = ?subscriber.id(),
                        panic = panic_message(payload.as_ref()),
                        "effect panicked"
                    );
                }
            } else {
                subscriber.notify(old, new);
            }
        }
    }

    fn is_subscribed(&self, id: NodeId, subscriber: SubscriberId) -> bool {
        self.inner
            .state
            .lock()
            .subscribers
            .get(&id)
            .is_some_and(|table| table.contains_id(subscriber))
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Store")
            .field("cached", &state.values.len())
            .field("subscribed_nodes", &state.subscribers.len())
            .field("graph_nodes", &state.graph.node_count())
            .field("in_flight", &state.in_flight.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Computed;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn isolated() -> (Arc<Registry>, Store) {
        let registry = Arc::new(Registry::new());
        let store = Store::with_registry(Arc::clone(&registry));
        (registry, store)
    }

    #[test]
    fn cell_default_is_materialized_on_first_read() {
        let (registry, store) = isolated();
        let cell = registry.register_cell(3_i32);

        assert!(!store.is_cached(&cell));
        assert_eq!(store.get(&cell).unwrap(), 3);
        assert!(store.is_cached(&cell));
    }

    #[test]
    fn computed_records_edges_in_the_graph() {
        let (registry, store) = isolated();
        let a = registry.register_cell(1_i32);
        let b = registry.register_cell(2_i32);
        let sum = registry.register_computed(move |read| Ok(read.get(&a)? + read.get(&b)?));

        assert_eq!(store.get(&sum).unwrap(), 3);
        assert_eq!(store.dependencies(&sum), vec![a.id(), b.id()]);
        assert_eq!(store.dependents(&a), vec![sum.id()]);
    }

    #[test]
    fn write_bumps_epochs_of_dependents() {
        let (registry, store) = isolated();
        let a = registry.register_cell(1_i32);
        let doubled = registry.register_computed(move |read| Ok(read.get(&a)? * 2));

        store.get(&doubled).unwrap();
        let before = store.inner.state.lock().epoch(doubled.id());
        store.set(&a, 2).unwrap();
        let after = store.inner.state.lock().epoch(doubled.id());

        assert_eq!(after, before + 1);
        assert!(!store.is_cached(&doubled));
    }

    #[test]
    fn failed_evaluation_caches_nothing() {
        let (registry, store) = isolated();
        let fail = Arc::new(AtomicUsize::new(1));
        let fail_clone = fail.clone();
        let flaky = registry.register_computed(move |_read| {
            if fail_clone.load(Ordering::SeqCst) == 1 {
                Err(StoreError::msg("not yet"))
            } else {
                Ok(5_u8)
            }
        });

        let err = store.get(&flaky).unwrap_err();
        assert!(matches!(err, StoreError::Message(ref m) if m == "not yet"));
        assert!(!store.is_cached(&flaky));

        fail.store(0, Ordering::SeqCst);
        assert_eq!(store.get(&flaky).unwrap(), 5);
    }

    #[test]
    fn sync_read_of_pending_async_computed_is_suspended() {
        let (registry, store) = isolated();
        let slow = Computed::new_async_in(&registry, |_read| async { Ok::<_, StoreError>(1_u8) });

        let err = store.get(&slow).unwrap_err();
        assert!(matches!(err, StoreError::Suspended(id) if id == slow.id()));
    }

    #[test]
    fn clear_effect_drops_empty_tables() {
        let (registry, store) = isolated();
        let cell = registry.register_cell(0_i32);
        let effect = Effect::new(|_: &Change<i32>| {});

        store.effect(&cell, &effect);
        assert_eq!(store.subscriber_count(&cell), 1);
        store.clear_effect(&cell, &effect);
        assert_eq!(store.subscriber_count(&cell), 0);
        assert!(store.inner.state.lock().subscribers.is_empty());

        // Clearing again is a no-op.
        store.clear_effect(&cell, &effect);
    }

    #[test]
    fn plugins_can_be_added_and_removed_by_name() {
        use crate::action::TracingPlugin;

        let store = Store::new();
        store.use_plugin(Arc::new(TracingPlugin::new("trace")));
        store.use_plugin(Arc::new(TracingPlugin::new("other")));
        assert_eq!(store.plugins().len(), 2);

        assert!(store.remove_plugin("trace"));
        assert!(!store.remove_plugin("trace"));
        assert_eq!(store.plugins().len(), 1);

        store.clear_plugins();
        assert!(store.plugins().is_empty());
    }

    #[test]
    fn panic_messages_are_extracted() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
