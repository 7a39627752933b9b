//! Execution Scheduler
//!
//! The scheduler determines the order in which a discovered graph is built
//! and executed. It ensures that dependencies always come before their
//! dependents.
//!
//! # Algorithm
//!
//! Kahn's algorithm over the descriptor arena:
//!
//! 1. Count the distinct dependencies of every descriptor
//! 2. Seed a queue with every descriptor that has none, in index order
//! 3. Pop the front, emit it, and decrement each dependent's count
//! 4. A dependent whose count reaches zero joins the back of the queue
//!
//! Seeding and visiting in index order makes the result deterministic for a
//! given graph. Discovery already rejected cycles, so every descriptor is
//! emitted.

use std::collections::VecDeque;

use super::discovery::DependencyGraph;
use super::node::{Descriptor, NodeIndex};

/// A dependency-respecting order over every descriptor of a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOrder {
    order: Vec<NodeIndex>,
}

impl ExecutionOrder {
    pub fn as_slice(&self) -> &[NodeIndex] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Where `index` falls in the order.
    pub fn position(&self, index: NodeIndex) -> Option<usize> {
        self.order.iter().position(|&candidate| candidate == index)
    }
}

/// Computes orderings over a [`DependencyGraph`].
pub struct Scheduler<'g> {
    graph: &'g DependencyGraph,
}

impl<'g> Scheduler<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self { graph }
    }

    /// Perform a topological sort of the whole graph.
    ///
    /// Returns nodes in order such that dependencies come before dependents.
    pub fn topological_order(&self) -> ExecutionOrder {
        let mut in_degree: Vec<usize> = self.graph.iter().map(Descriptor::in_degree).collect();
        let mut queue: VecDeque<NodeIndex> = self
            .graph
            .iter()
            .filter(|descriptor| descriptor.in_degree() == 0)
            .map(Descriptor::index)
            .collect();
        let mut order = Vec::with_capacity(self.graph.len());

        // Kahn's algorithm
        while let Some(index) = queue.pop_front() {
            order.push(index);

            for &dependent in self.graph.descriptor(index).dependents() {
                let degree = &mut in_degree[dependent.index()];
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        debug_assert_eq!(order.len(), self.graph.len(), "graph contains a cycle");
        ExecutionOrder { order }
    }

    /// Longest distance from any leaf, per descriptor.
    ///
    /// Nodes without dependencies sit at depth 0.
    pub fn depths(&self) -> Vec<usize> {
        let mut depths = vec![0; self.graph.len()];
        for index in self.topological_order().iter() {
            let depth = self
                .graph
                .descriptor(index)
                .dependencies()
                .iter()
                .map(|dependency| depths[dependency.index()] + 1)
                .max()
                .unwrap_or(0);
            depths[index.index()] = depth;
        }
        depths
    }

    /// Descriptors grouped by depth. Nodes in one layer do not depend on
    /// each other.
    pub fn layers(&self) -> Vec<Vec<NodeIndex>> {
        let depths = self.depths();
        let height = depths.iter().max().map_or(0, |max| max + 1);
        let mut layers = vec![Vec::new(); height];
        for (position, depth) in depths.into_iter().enumerate() {
            layers[depth].push(NodeIndex::new(position));
        }
        layers
    }
}
