//! Dependency Graph
//!
//! This module implements the structural side of the engine: which types a
//! root calculation needs, how they connect, and in what order they can be
//! built.
//!
//! # Overview
//!
//! The dependency graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes are [`Descriptor`]s, one per distinct [`NodeType`]
//! - Edges are dependencies: if A needs B, B is in A's dependencies and A is
//!   in B's dependents
//!
//! A graph is discovered once per root type and then reused by every
//! resolution pass of the tree that owns it. It never holds instances or
//! values.
//!
//! # Design Decisions
//!
//! 1. Descriptors live in a dense arena and refer to each other by
//!    [`NodeIndex`]. An identity-to-index side table serves external lookups.
//!
//! 2. Dependents are derived from dependencies after discovery, so the two
//!    edge directions cannot disagree.
//!
//! 3. Cycle detection happens during discovery. The scheduler trusts that
//!    the graph it receives is acyclic.

mod cycle;
mod discovery;
mod identity;
mod node;
mod scheduler;

pub use cycle::{Cycle, CycleTracker};
pub use discovery::DependencyGraph;
pub use identity::NodeType;
pub use node::{Descriptor, NodeIndex, NodeKind, Parameter};
pub use scheduler::{ExecutionOrder, Scheduler};
