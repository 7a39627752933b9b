//! Node Instances
//!
//! A [`Node`] is one live calculation inside a resolution pass. It owns the
//! user's calculation value, the output once computed, and the issues
//! recorded while computing it.
//!
//! # Lifecycle
//!
//! 1. Built by the tree once every dependency instance exists.
//!
//! 2. Executed exactly once, after all of its dependencies executed.
//!    Execution clears the issue set, runs the calculation, and marks the
//!    node resolved.
//!
//! 3. Released when the tree drops the pass that built it, unless a caller
//!    still holds a handle. Nodes are never reused across passes.
//!
//! Reading the value before step 2 fails with
//! [`GraphError::NotResolved`].
//!
//! # Sharing
//!
//! Nodes are handed around as `Arc<Node<T>>` so that two dependents of the
//! same type observe the same instance. The mutable part sits behind a lock
//! and is only written by the tree that owns the pass.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use indexmap::IndexSet;
use parking_lot::RwLock;

use super::contract::Calculation;
use super::issues::Issues;
use crate::error::{GraphError, Result};
use crate::graph::NodeType;

/// Mutable part of a node.
struct NodeState<V> {
    /// The computed output (None until resolved).
    value: Option<V>,

    /// Issues from the latest execution.
    issues: Issues,

    resolved: bool,
}

/// A live calculation instance inside a resolution pass.
pub struct Node<T: Calculation> {
    calculation: Arc<T>,
    state: RwLock<NodeState<T::Output>>,
}

impl<T: Calculation> Node<T> {
    pub(crate) fn new(calculation: T) -> Self {
        Self::from_shared(Arc::new(calculation))
    }

    /// Wrap an instance that is also held elsewhere, such as a supplied input.
    pub(crate) fn from_shared(calculation: Arc<T>) -> Self {
        Self {
            calculation,
            state: RwLock::new(NodeState {
                value: None,
                issues: Issues::new(),
                resolved: false,
            }),
        }
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::of::<T>()
    }

    /// The calculation this node wraps, including its dependency handles.
    pub fn calculation(&self) -> &T {
        &self.calculation
    }

    /// The computed value.
    pub fn value(&self) -> Result<T::Output> {
        self.with_value(|value| value.clone())
    }

    /// Borrow the computed value without cloning it.
    pub fn with_value<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&T::Output) -> R,
    {
        let state = self.state.read();
        match (&state.value, state.resolved) {
            (Some(value), true) => Ok(f(value)),
            _ => Err(GraphError::NotResolved {
                node: self.node_type(),
            }),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.state.read().resolved
    }

    /// Issues recorded by the latest execution.
    pub fn issues(&self) -> Issues {
        self.state.read().issues.clone()
    }

    fn begin(&self) -> Issues {
        let mut state = self.state.write();
        debug_assert!(!state.resolved, "node executed twice in one pass");
        state.issues.clear();
        Issues::new()
    }

    fn complete(&self, value: T::Output, issues: Issues) -> Result<()> {
        let abort = issues.abort_reason().map(str::to_owned);
        let mut state = self.state.write();
        state.issues = issues;

        if let Some(reason) = abort {
            return Err(GraphError::Aborted {
                node: self.node_type(),
                reason,
            });
        }

        state.value = Some(value);
        state.resolved = true;
        Ok(())
    }
}

impl<T> fmt::Debug for Node<T>
where
    T: Calculation,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Node")
            .field("node_type", &self.node_type())
            .field("resolved", &state.resolved)
            .field("issue_count", &state.issues.len())
            .finish()
    }
}

/// Type-erased view of a [`Node`] used by the tree's instance table.
pub(crate) trait ErasedNode: Send + Sync {
    fn node_type(&self) -> NodeType;

    fn execute(&self) -> Result<()>;

    fn execute_async(&self) -> BoxFuture<'_, Result<()>>;

    fn is_resolved(&self) -> bool;

    fn errors(&self) -> IndexSet<String>;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Calculation> ErasedNode for Node<T> {
    fn node_type(&self) -> NodeType {
        Node::node_type(self)
    }

    fn execute(&self) -> Result<()> {
        let mut issues = self.begin();
        let value = self.calculation.calculate(&mut issues);
        self.complete(value, issues)
    }

    fn execute_async(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut issues = self.begin();
            let value = self.calculation.calculate_async(&mut issues).await;
            self.complete(value, issues)
        })
    }

    fn is_resolved(&self) -> bool {
        Node::is_resolved(self)
    }

    fn errors(&self) -> IndexSet<String> {
        self.issues().into_set()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
