//! Action definition and dispatch.

use std::fmt;
use std::sync::Arc;

use tracing::debug_span;

use super::plugin::{ActionContext, Plugin};
use crate::error::Result;
use crate::reactive::Store;

type Handler<P, R> = Arc<dyn Fn(&Store, &P) -> Result<R> + Send + Sync>;

/// A mutation handler with its own plugins.
///
/// # Example
///
/// ```rust
/// use relax_core::{dispatch, Action, Cell, Store};
///
/// let count = Cell::new(0_i32);
/// let add = Action::named("add", move |store: &Store, amount: &i32| {
///     store.update(&count, |current| current + amount)?;
///     store.get(&count)
/// });
///
/// let store = Store::new();
/// assert_eq!(dispatch(&add, &store, 2).unwrap(), 2);
/// assert_eq!(add.call(&store, 3).unwrap(), 5);
/// ```
pub struct Action<P, R> {
    name: Option<String>,
    handler: Handler<P, R>,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl<P, R> Action<P, R>
where
    P: fmt::Debug,
    R: fmt::Debug,
{
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Store, &P) -> Result<R> + Send + Sync + 'static,
    {
        Self {
            name: None,
            handler: Arc::new(handler),
            plugins: Vec::new(),
        }
    }

    pub fn named<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Store, &P) -> Result<R> + Send + Sync + 'static,
    {
        Self {
            name: Some(name.into()),
            ..Self::new(handler)
        }
    }

    /// Attach a plugin that runs only for this action, after the store's
    /// plugins.
    pub fn with_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    /// Shorthand for [`dispatch`].
    pub fn call(&self, store: &Store, payload: P) -> Result<R> {
        dispatch(self, store, payload)
    }
}

impl<P, R> Clone for Action<P, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            handler: Arc::clone(&self.handler),
            plugins: self.plugins.clone(),
        }
    }
}

impl<P, R> fmt::Debug for Action<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

/// Run an action against a store.
///
/// Hooks run in order: `on_before` for every store plugin then every action
/// plugin, the handler, then `on_after` with the result or `on_error` with
/// the error, in the same plugin order. The handler's error is returned
/// unchanged.
pub fn dispatch<P, R>(action: &Action<P, R>, store: &Store, payload: P) -> Result<R>
where
    P: fmt::Debug,
    R: fmt::Debug,
{
    let span = debug_span!("dispatch", action = action.name().unwrap_or("<anonymous>"));
    let _entered = span.enter();

    let mut plugins = store.plugins();
    plugins.extend(action.plugins.iter().cloned());

    let context = ActionContext {
        name: action.name(),
        payload: &payload,
    };
    for plugin in &plugins {
        plugin.on_before(&context);
    }

    match (action.handler)(store, &payload) {
        Ok(result) => {
            for plugin in &plugins {
                plugin.on_after(&context, &result);
            }
            Ok(result)
        }
        Err(error) => {
            for plugin in &plugins {
                plugin.on_error(&context, &error);
            }
            Err(error)
        }
    }
}
