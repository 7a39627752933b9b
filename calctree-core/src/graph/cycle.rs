//! Cycle Tracker
//!
//! Depth-first traversals push each item they enter and pop it on the way
//! out. Entering an item that is already on the stack means the traversal
//! has walked back into its own path, which is a cycle.
//!
//! Detection is per path, not global: the same item may be entered and left
//! any number of times from sibling branches. Only being on the stack twice
//! at once is an error.

use std::collections::HashSet;
use std::hash::Hash;

use crate::error::GraphError;
use crate::graph::NodeType;

/// A cycle found by a [`CycleTracker`].
///
/// `path` runs from the traversal root to the item that closed the cycle,
/// so the offending item appears both at its first position and at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle<T> {
    pub path: Vec<T>,
}

impl From<Cycle<NodeType>> for GraphError {
    fn from(cycle: Cycle<NodeType>) -> Self {
        GraphError::Cycle { path: cycle.path }
    }
}

/// Visit/unvisit stack for depth-first traversals.
#[derive(Debug, Clone)]
pub struct CycleTracker<T> {
    visited: HashSet<T>,
    stack: Vec<T>,
}

impl<T> CycleTracker<T>
where
    T: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            visited: HashSet::new(),
            stack: Vec::new(),
        }
    }

    /// Push `item` onto the current path.
    ///
    /// Fails if `item` is already on the path.
    pub fn visit(&mut self, item: T) -> Result<(), Cycle<T>> {
        if !self.visited.insert(item) {
            let mut path = self.stack.clone();
            path.push(item);
            return Err(Cycle { path });
        }
        self.stack.push(item);
        Ok(())
    }

    /// Remove `item` from the current path.
    pub fn unvisit(&mut self, item: T) {
        if !self.visited.remove(&item) {
            return;
        }
        if self.stack.last() == Some(&item) {
            self.stack.pop();
        } else if let Some(position) = self.stack.iter().rposition(|entry| *entry == item) {
            self.stack.remove(position);
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.visited.contains(item)
    }

    /// The current path, root first.
    pub fn path(&self) -> &[T] {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl<T> Default for CycleTracker<T>
where
    T: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
