//! Actions
//!
//! An [`Action`] is a named mutation: a handler that receives a [`Store`] and
//! a payload. Running it through [`dispatch`] surrounds the handler with
//! [`Plugin`] hooks, so cross-cutting concerns (logging, auditing, timing)
//! can observe every mutation without touching the handlers.
//!
//! Plugins come from two places: the store's own list
//! ([`Store::use_plugin`]) and the action's list ([`Action::with_plugin`]).
//! Store plugins run first.
//!
//! [`Store`]: crate::Store
//! [`Store::use_plugin`]: crate::Store::use_plugin

mod dispatch;
mod plugin;

pub use dispatch::{dispatch, Action};
pub use plugin::{ActionContext, Plugin, TracingPlugin};
