//! Dependency Graph
//!
//! This module implements the graph that records which computed nodes were
//! derived from which other nodes inside a store.
//!
//! # Overview
//!
//! The graph is directed:
//!
//! - Nodes are cells (sources) or computeds (derived values)
//! - Edges represent dependencies: if A reads B, there is an edge from B to A
//!
//! When a cell changes, the store walks the graph to find every affected
//! computed and evicts its cached value. Nothing is recomputed at that point;
//! evicted computeds are evaluated again on their next read.
//!
//! # Design Decisions
//!
//! 1. Each store owns its own graph. Node metadata is shared through the
//!    [`Registry`](crate::Registry), edges and values are not.
//!
//! 2. We maintain both forward (dependencies) and reverse (dependents) edges
//!    so that invalidation and dependency swaps are both cheap.
//!
//! 3. Dependency sets are swapped by diff, never cleared and rebuilt.

mod dependency;
mod node;

pub use dependency::{DependencyDiff, DependencyGraph};
pub use node::{GraphNode, NodeId, NodeKind};
