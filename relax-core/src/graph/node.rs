//! Graph Nodes
//!
//! Node identifiers and the per-node edge sets stored in a
//! [`DependencyGraph`](super::DependencyGraph).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;

/// The kind of node a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A mutable leaf value with a default. Cells have dependents but never
    /// dependencies.
    Cell,

    /// A derived value computed from other nodes and cached per store.
    Computed,
}

impl NodeKind {
    fn prefix(self) -> &'static str {
        match self {
            NodeKind::Cell => "cell",
            NodeKind::Computed => "computed",
        }
    }
}

/// Unique identifier for a node.
///
/// Ids combine the node kind with a process-wide counter, so they are unique
/// across every registry in the process. Clients cannot construct them; they
/// only come out of registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    kind: NodeKind,
    index: u64,
}

impl NodeId {
    /// Allocate the next id for a node of the given kind.
    pub(crate) fn next(kind: NodeKind) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self {
            kind,
            index: COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// The kind encoded in this id.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Get the raw counter value.
    pub fn raw(&self) -> u64 {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.prefix(), self.index)
    }
}

/// Edges of one node in the dependency graph.
#[derive(Debug, Default, Clone)]
pub struct GraphNode {
    /// Nodes that this node reads from.
    dependencies: IndexSet<NodeId>,

    /// Nodes that read from this node.
    dependents: IndexSet<NodeId>,
}

impl GraphNode {
    pub fn add_dependency(&mut self, node_id: NodeId) -> bool {
        self.dependencies.insert(node_id)
    }

    pub fn remove_dependency(&mut self, node_id: NodeId) -> bool {
        self.dependencies.shift_remove(&node_id)
    }

    pub fn dependencies(&self) -> &IndexSet<NodeId> {
        &self.dependencies
    }

    pub fn add_dependent(&mut self, node_id: NodeId) -> bool {
        self.dependents.insert(node_id)
    }

    pub fn remove_dependent(&mut self, node_id: NodeId) -> bool {
        self.dependents.shift_remove(&node_id)
    }

    pub fn dependents(&self) -> &IndexSet<NodeId> {
        &self.dependents
    }

    /// A node with no edges in either direction can be dropped from the graph.
    pub fn is_isolated(&self) -> bool {
        self.dependencies.is_empty() && self.dependents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_unique() {
        let id1 = NodeId::next(NodeKind::Cell);
        let id2 = NodeId::next(NodeKind::Cell);
        let id3 = NodeId::next(NodeKind::Computed);
        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert!(id2.raw() > id1.raw());
    }

    #[test]
    fn node_ids_display_with_kind_prefix() {
        let cell = NodeId::next(NodeKind::Cell);
        let computed = NodeId::next(NodeKind::Computed);
        assert_eq!(cell.to_string(), format!("cell#{}", cell.raw()));
        assert_eq!(computed.to_string(), format!("computed#{}", computed.raw()));
        assert_eq!(computed.kind(), NodeKind::Computed);
    }

    #[test]
    fn edge_management() {
        let mut node = GraphNode::default();
        let dep1 = NodeId::next(NodeKind::Cell);
        let dep2 = NodeId::next(NodeKind::Cell);

        assert!(node.is_isolated());
        assert!(node.add_dependency(dep1));
        assert!(node.add_dependency(dep2));
        assert!(!node.add_dependency(dep1));
        assert_eq!(node.dependencies().len(), 2);

        assert!(node.remove_dependency(dep1));
        assert!(!node.dependencies().contains(&dep1));
        assert_eq!(node.dependencies().len(), 1);

        node.remove_dependency(dep2);
        assert!(node.is_isolated());
    }
}
