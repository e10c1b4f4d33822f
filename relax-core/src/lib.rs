//! Relax Core
//!
//! This crate provides the state engine behind the Relax state library. It
//! implements:
//!
//! - Cells: mutable values with a default
//! - Computeds: cached derived values, synchronous or asynchronous
//! - Effects: change callbacks subscribed to a node in a store
//! - Actions: mutations wrapped in plugin hooks
//! - Events: typed dispatchers with attachable listeners
//!
//! The crate is designed to be used both as a native Rust library and, with
//! the `python` feature, as a Python extension module via PyO3.
//!
//! # Architecture
//!
//! - `registry`: node definitions, addressed by copyable ids
//! - `reactive`: handles, the evaluation accessor, effects and the [`Store`]
//! - `graph`: per-store dependency edges and invalidation order
//! - `action`: actions, dispatch and plugins
//! - `config`: store configuration
//! - `event`: standalone typed events
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use relax_core::{Cell, Computed, Store};
//!
//! let count = Cell::new(0_i32);
//! let doubled = Computed::new(move |read| Ok(read.get(&count)? * 2));
//!
//! let store = Store::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! store.subscribe(&doubled, move |change| sink.lock().unwrap().push(change.new_value));
//!
//! assert_eq!(store.get(&doubled).unwrap(), 0);
//! store.set(&count, 5).unwrap();
//! assert_eq!(store.get(&doubled).unwrap(), 10);
//! assert_eq!(*seen.lock().unwrap(), vec![10]);
//! ```

pub mod action;
pub mod config;
pub mod error;
pub mod event;
pub mod graph;
pub mod reactive;
pub mod registry;

#[cfg(feature = "python")]
mod python;

pub use action::{dispatch, Action, ActionContext, Plugin, TracingPlugin};
pub use config::{ConfigError, StoreConfig};
pub use error::{Result, StoreError};
pub use event::{Event, Listener};
pub use graph::{NodeId, NodeKind};
pub use reactive::{
    AnyValue, Cell, Change, Computed, Effect, Handle, Read, Store, SubscriberId, Unsubscribe,
    Value,
};
pub use registry::{NodeDescriptor, Registry};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module definition.
///
/// This function is called by Python when importing the module.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register(m)
}
