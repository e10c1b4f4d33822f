//! Plugin hooks around action dispatch.

use std::fmt;

use crate::error::StoreError;

/// What a plugin sees of the action being dispatched.
#[derive(Clone, Copy)]
pub struct ActionContext<'a> {
    pub name: Option<&'a str>,
    pub payload: &'a dyn fmt::Debug,
}

impl fmt::Debug for ActionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("name", &self.name)
            .field("payload", self.payload)
            .finish()
    }
}

/// Hooks run around an action's handler.
///
/// Every hook defaults to doing nothing. Hooks cannot change the outcome of
/// the action.
pub trait Plugin: Send + Sync {
    /// Name used by [`Store::remove_plugin`](crate::Store::remove_plugin).
    fn name(&self) -> Option<&str> {
        None
    }

    fn on_before(&self, _context: &ActionContext<'_>) {}

    fn on_after(&self, _context: &ActionContext<'_>, _result: &dyn fmt::Debug) {}

    fn on_error(&self, _context: &ActionContext<'_>, _error: &StoreError) {}
}

/// Logs action lifecycle events through `tracing`.
#[derive(Debug, Clone)]
pub struct TracingPlugin {
    name: String,
}

impl TracingPlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self::new("tracing")
    }
}

impl Plugin for TracingPlugin {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn on_before(&self, context: &ActionContext<'_>) {
        tracing::debug!(
            action = context.name.unwrap_or("<anonymous>"),
            payload = ?context.payload,
            "action started"
        );
    }

    fn on_after(&self, context: &ActionContext<'_>, result: &dyn fmt::Debug) {
        tracing::debug!(
            action = context.name.unwrap_or("<anonymous>"),
            ?result,
            "action finished"
        );
    }

    fn on_error(&self, context: &ActionContext<'_>, error: &StoreError) {
        tracing::warn!(
            action = context.name.unwrap_or("<anonymous>"),
            %error,
            "action failed"
        );
    }
}
