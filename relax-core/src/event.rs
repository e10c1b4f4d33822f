//! Typed Events
//!
//! An [`Event`] is a standalone dispatcher: listeners are attached with
//! [`Event::on`], detached with [`Event::off`], and every [`Event::emit`]
//! calls the attached listeners in the order they were attached. Events are
//! not tied to a store and do not participate in dependency tracking.
//!
//! Listener identity works like [`Effect`](crate::Effect) identity: clones of
//! a [`Listener`] are the same listener, so attaching one twice keeps a single
//! entry and removing it once detaches it.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::trace;

/// A callback attached to an [`Event`].
pub struct Listener<T> {
    callback: Arc<dyn Fn(&T) + Send + Sync>,
}

impl<T> Listener<T> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    fn key(&self) -> usize {
        Arc::as_ptr(&self.callback) as *const () as usize
    }

    /// Whether two listeners share an identity.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("refs", &Arc::strong_count(&self.callback))
            .finish()
    }
}

/// Dispatcher for values of type `T`.
///
/// Cloning an event yields another handle to the same listener set.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use relax_core::{Event, Listener};
///
/// let greeted = Event::<String>::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let listener = Listener::new(move |name: &String| sink.lock().unwrap().push(name.clone()));
///
/// greeted.on(&listener);
/// greeted.emit(&String::from("ada"));
/// greeted.off(&listener);
/// greeted.emit(&String::from("grace"));
///
/// assert_eq!(*seen.lock().unwrap(), vec!["ada"]);
/// ```
pub struct Event<T> {
    listeners: Arc<RwLock<IndexMap<usize, Listener<T>>>>,
}

impl<T> Event<T> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Attach a listener. Attaching one that is already attached keeps its
    /// original position.
    pub fn on(&self, listener: &Listener<T>) {
        self.listeners
            .write()
            .entry(listener.key())
            .or_insert_with(|| listener.clone());
    }

    /// Attach a closure, returning the listener to detach it with.
    pub fn listen<F>(&self, callback: F) -> Listener<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let listener = Listener::new(callback);
        self.on(&listener);
        listener
    }

    /// Detach a listener. Returns `false` if it was not attached.
    pub fn off(&self, listener: &Listener<T>) -> bool {
        self.listeners.write().shift_remove(&listener.key()).is_some()
    }

    /// Call every attached listener with `value`.
    ///
    /// Listeners attached or detached by a listener take effect from the
    /// next emit.
    pub fn emit(&self, value: &T) {
        let listeners: Vec<_> = self.listeners.read().values().cloned().collect();
        trace!(listeners = listeners.len(), "event emitted");
        for listener in listeners {
            (listener.callback)(value);
        }
    }

    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("listeners", &self.len())
            .finish()
    }
}
