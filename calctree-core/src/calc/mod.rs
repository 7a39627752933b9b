//! Calculations
//!
//! This module implements the runtime side of the engine: the contract a
//! type fulfils to take part in a graph, the live instances built during a
//! resolution pass, and the tree that drives those passes.
//!
//! # Overview
//!
//! - [`Calculation`] declares a static dependency signature, a factory, and
//!   a calculation step.
//! - [`Inputs`] carries the values a caller supplies for the leaves.
//! - [`CalculationTree`] discovers the graph once, then binds inputs,
//!   orders, instantiates, and executes on every pass.
//! - [`Node`] is one live instance. Dependents hold `Arc<Node<T>>` handles
//!   to their dependencies and read values through them.
//!
//! # Errors
//!
//! Two channels exist. Structural problems (cycles, missing inputs, broken
//! factories) are [`GraphError`](crate::error::GraphError)s and fail the
//! pass. Problems a node finds in its own data go into its [`Issues`] and
//! the pass carries on, unless the node calls [`Issues::abort`].

mod args;
mod contract;
mod inputs;
mod issues;
mod node;
mod report;
mod tree;

pub use args::Args;
pub use contract::{Calculation, Dependency};
pub use inputs::{InputEntry, Inputs};
pub use issues::Issues;
pub use node::Node;
pub use report::{GraphReport, NodeReport};
pub use tree::{CalculationTree, PassStage};

pub(crate) use contract::Blueprint;
