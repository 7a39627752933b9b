//! Calctree Core
//!
//! This crate provides a dependency-graph engine for typed calculations.
//! It implements:
//!
//! - Discovery of everything a root calculation transitively needs
//! - Cycle detection with the offending path
//! - Binding of caller-supplied inputs to the graph's leaves
//! - Topological ordering, instantiation, and execution (sync or async)
//! - Typed lookups of built nodes and supplied values after a pass
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: type identity, descriptors, discovery, and scheduling
//! - `calc`: the calculation contract, node instances, and the tree
//! - `config`: settings that change discovery and logging behaviour
//! - `error`: the error type shared by every module
//!
//! # Example
//!
//! ```rust,ignore
//! use calctree_core::{Args, Calculation, CalculationTree, Dependency, Inputs, Issues, Result};
//!
//! #[derive(Clone)]
//! struct Quantity(u32);
//!
//! struct Total { quantity: Quantity }
//!
//! impl Calculation for Total {
//!     type Output = u32;
//!
//!     fn dependencies() -> Vec<Dependency> {
//!         vec![Dependency::leaf::<Quantity>()]
//!     }
//!
//!     fn construct(args: &mut Args<'_>) -> Result<Self> {
//!         Ok(Self { quantity: args.leaf()? })
//!     }
//!
//!     fn calculate(&self, _issues: &mut Issues) -> u32 {
//!         self.quantity.0 * 10
//!     }
//! }
//!
//! let mut tree = CalculationTree::<Total>::new()?;
//! assert_eq!(tree.resolve(Inputs::new().with(Quantity(3)))?, 30);
//! ```

pub mod calc;
pub mod config;
pub mod error;
pub mod graph;

#[cfg(test)]
mod testing;

pub use calc::{
    Args, Calculation, CalculationTree, Dependency, GraphReport, InputEntry, Inputs, Issues, Node, NodeReport,
    PassStage,
};
pub use config::{TreeConfig, ZeroDependencyPolicy};
pub use error::{GraphError, MissingInput, Result};
pub use graph::NodeType;
