//! Error types for the store.
//!
//! Every fallible operation returns [`StoreError`]. The enum is `Clone`
//! because the result of an asynchronous computed evaluation is shared
//! between every reader awaiting it.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use crate::graph::NodeId;

/// Result alias used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Errors raised by registry lookups, evaluation and user callbacks.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The node is not (or no longer) present in the store's registry.
    #[error("node {0} not found")]
    NotFound(NodeId),

    /// A computed node depends on itself, directly or transitively.
    ///
    /// `cycle` lists the evaluation chain from the first occurrence of `id`
    /// back to `id`.
    #[error("circular dependency detected at {id}: {}", format_cycle(.cycle))]
    CircularDependency { id: NodeId, cycle: Vec<NodeId> },

    /// An asynchronous computed was read synchronously before it had a
    /// cached value.
    #[error("computed {0} is asynchronous and has no cached value")]
    Suspended(NodeId),

    /// The cached value for a node does not have the handle's type.
    #[error("node {0} holds a value of an unexpected type")]
    TypeMismatch(NodeId),

    /// The store an evaluation belongs to was dropped before the evaluation
    /// finished reading through it.
    #[error("store was dropped during evaluation")]
    StoreDropped,

    /// Plain message raised by a compute function or action handler.
    #[error("{0}")]
    Message(String),

    /// Arbitrary error raised by a compute function or action handler.
    #[error("{0}")]
    External(Arc<dyn StdError + Send + Sync>),
}

impl StoreError {
    /// Build an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wrap any error type.
    pub fn external<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::External(Arc::new(error))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_circular(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }

    /// The node the error is about, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::NotFound(id)
            | Self::Suspended(id)
            | Self::TypeMismatch(id)
            | Self::CircularDependency { id, .. } => Some(*id),
            Self::StoreDropped | Self::Message(_) | Self::External(_) => None,
        }
    }
}

fn format_cycle(cycle: &[NodeId]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
