//! Dependency Graph
//!
//! Forward and reverse edges between nodes of one store. An edge
//! `dependency -> dependent` means the dependent's cached value was computed
//! from the dependency and must be evicted when the dependency changes.
//!
//! # Invalidation order
//!
//! When a node changes we collect every transitive dependent with a BFS and
//! return them in topological order (dependencies before dependents) using
//! Kahn's algorithm, so callers that recompute eagerly never read a value
//! that is about to be evicted.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexSet;

use super::node::{GraphNode, NodeId};

/// Outcome of swapping a node's dependency set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencyDiff {
    /// Dependencies that were not present before.
    pub added: Vec<NodeId>,

    /// Dependencies that are no longer read.
    pub removed: Vec<NodeId>,
}

impl DependencyDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Edge store for one [`Store`](crate::Store).
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Nodes that have at least one edge, indexed by ID.
    nodes: HashMap<NodeId, GraphNode>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency edge: `dependent` depends on `dependency`.
    ///
    /// Returns `false` if the edge already existed.
    pub fn add_edge(&mut self, dependency: NodeId, dependent: NodeId) -> bool {
        let added = self
            .nodes
            .entry(dependent)
            .or_default()
            .add_dependency(dependency);
        self.nodes
            .entry(dependency)
            .or_default()
            .add_dependent(dependent);
        added
    }

    /// Remove a dependency edge.
    pub fn remove_edge(&mut self, dependency: NodeId, dependent: NodeId) {
        if let Some(node) = self.nodes.get_mut(&dependency) {
            node.remove_dependent(dependent);
        }
        if let Some(node) = self.nodes.get_mut(&dependent) {
            node.remove_dependency(dependency);
        }
        self.prune(dependency);
        self.prune(dependent);
    }

    /// Replace the dependency set of `dependent` with `next`.
    ///
    /// The new set is fully collected by the caller before the swap, so only
    /// edges that disappeared are removed and only new edges are added.
    pub fn replace_dependencies(
        &mut self,
        dependent: NodeId,
        next: &IndexSet<NodeId>,
    ) -> DependencyDiff {
        let previous = self
            .nodes
            .get(&dependent)
            .map(|node| node.dependencies().clone())
            .unwrap_or_default();

        let mut diff = DependencyDiff::default();
        for &old in previous.iter() {
            if !next.contains(&old) {
                self.remove_edge(old, dependent);
                diff.removed.push(old);
            }
        }
        for &new in next.iter() {
            if !previous.contains(&new) {
                self.add_edge(new, dependent);
                diff.added.push(new);
            }
        }
        diff
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, node_id: NodeId) {
        if let Some(node) = self.nodes.remove(&node_id) {
            for dep_id in node.dependencies() {
                if let Some(dep) = self.nodes.get_mut(dep_id) {
                    dep.remove_dependent(node_id);
                }
                self.prune(*dep_id);
            }
            for dependent_id in node.dependents() {
                if let Some(dependent) = self.nodes.get_mut(dependent_id) {
                    dependent.remove_dependency(node_id);
                }
                self.prune(*dependent_id);
            }
        }
    }

    pub fn dependencies(&self, node_id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node_id)
            .map(|node| node.dependencies().iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn dependents(&self, node_id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node_id)
            .map(|node| node.dependents().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every node that transitively depends on `source`, in topological order.
    ///
    /// `source` itself is not part of the result.
    pub fn affected_by(&self, source: NodeId) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut affected = Vec::new();
        let mut queue = VecDeque::new();

        if let Some(node) = self.nodes.get(&source) {
            queue.extend(node.dependents().iter().copied());
        }
        visited.insert(source);

        while let Some(node_id) = queue.pop_front() {
            if !visited.insert(node_id) {
                continue;
            }
            affected.push(node_id);
            if let Some(node) = self.nodes.get(&node_id) {
                queue.extend(node.dependents().iter().copied());
            }
        }

        self.topological_sort(affected)
    }

    /// Kahn's algorithm restricted to `nodes`.
    ///
    /// Nodes left over by a cycle are appended in BFS order so that nothing
    /// is dropped from an invalidation pass.
    fn topological_sort(&self, nodes: Vec<NodeId>) -> Vec<NodeId> {
        let node_set: HashSet<_> = nodes.iter().copied().collect();
        let mut in_degree: HashMap<NodeId, usize> = HashMap::new();
        let mut result = Vec::with_capacity(nodes.len());
        let mut queue = VecDeque::new();

        for &node_id in &nodes {
            let degree = self
                .nodes
                .get(&node_id)
                .map(|node| {
                    node.dependencies()
                        .iter()
                        .filter(|d| node_set.contains(*d))
                        .count()
                })
                .unwrap_or(0);
            in_degree.insert(node_id, degree);
            if degree == 0 {
                queue.push_back(node_id);
            }
        }

        while let Some(node_id) = queue.pop_front() {
            result.push(node_id);
            if let Some(node) = self.nodes.get(&node_id) {
                for dependent_id in node.dependents() {
                    if let Some(degree) = in_degree.get_mut(dependent_id) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            queue.push_back(*dependent_id);
                        }
                    }
                }
            }
        }

        if result.len() < nodes.len() {
            let placed: HashSet<_> = result.iter().copied().collect();
            result.extend(nodes.into_iter().filter(|id| !placed.contains(id)));
        }

        result
    }

    /// Number of nodes that currently have edges.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes that currently have edges, in no particular order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    fn prune(&mut self, node_id: NodeId) {
        if self
            .nodes
            .get(&node_id)
            .is_some_and(GraphNode::is_isolated)
        {
            self.nodes.remove(&node_id);
        }
    }
}
