//! Calculation Contract
//!
//! What the engine needs from a type before it can place it in a graph:
//!
//! - a static dependency signature, readable without an instance
//! - a factory that consumes exactly that signature
//! - a calculation step, synchronous and optionally asynchronous
//!
//! Types declare their dependencies with [`Dependency`]. A dependency made with
//! [`Dependency::node`] is a calculation the engine builds; one made with
//! [`Dependency::leaf`] is an input the caller supplies.
//!
//! # Example
//!
//! ```rust,ignore
//! struct Price { base: BasePrice }
//!
//! impl Calculation for Price {
//!     type Output = f64;
//!
//!     fn dependencies() -> Vec<Dependency> {
//!         vec![Dependency::leaf::<BasePrice>()]
//!     }
//!
//!     fn construct(args: &mut Args<'_>) -> Result<Self> {
//!         Ok(Self { base: args.leaf()? })
//!     }
//!
//!     fn calculate(&self, _issues: &mut Issues) -> f64 {
//!         self.base.0
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::args::Args;
use super::inputs::SharedValue;
use super::issues::Issues;
use super::node::{ErasedNode, Node};
use crate::error::Result;
use crate::graph::NodeType;

/// A type whose value is produced by the engine from other values.
pub trait Calculation: Send + Sync + Sized + 'static {
    /// The value this calculation produces.
    type Output: Clone + Send + Sync + 'static;

    /// The ordered list of values needed to construct this type.
    ///
    /// Must return the same list every time it is called.
    fn dependencies() -> Vec<Dependency>;

    /// Build an instance from the values named by [`Calculation::dependencies`],
    /// taken from `args` in the same order.
    fn construct(args: &mut Args<'_>) -> Result<Self>;

    /// Compute the value. Problems worth reporting go into `issues`.
    fn calculate(&self, issues: &mut Issues) -> Self::Output;

    /// Asynchronous form of [`Calculation::calculate`].
    ///
    /// The default runs the synchronous calculation.
    fn calculate_async<'a>(&'a self, issues: &'a mut Issues) -> BoxFuture<'a, Self::Output> {
        Box::pin(async move { self.calculate(issues) })
    }
}

/// Static knowledge of how to build one calculation type.
#[derive(Clone, Copy)]
pub(crate) struct Blueprint {
    signature: fn() -> Vec<Dependency>,
    instantiate: fn(&mut Args<'_>) -> Result<Arc<dyn ErasedNode>>,
    adopt: fn(SharedValue) -> Option<Arc<dyn ErasedNode>>,
}

impl Blueprint {
    fn of<T: Calculation>() -> Self {
        Self {
            signature: T::dependencies,
            instantiate: instantiate::<T>,
            adopt: adopt::<T>,
        }
    }

    pub(crate) fn signature(&self) -> Vec<Dependency> {
        (self.signature)()
    }

    pub(crate) fn instantiate(&self, args: &mut Args<'_>) -> Result<Arc<dyn ErasedNode>> {
        (self.instantiate)(args)
    }

    /// Wrap a caller-supplied instance in an unexecuted node.
    ///
    /// Returns `None` if `value` is not an instance of this blueprint's type.
    pub(crate) fn adopt(&self, value: SharedValue) -> Option<Arc<dyn ErasedNode>> {
        (self.adopt)(value)
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Blueprint")
    }
}

fn instantiate<T: Calculation>(args: &mut Args<'_>) -> Result<Arc<dyn ErasedNode>> {
    let calculation = T::construct(args)?;
    Ok(Arc::new(Node::new(calculation)))
}

fn adopt<T: Calculation>(value: SharedValue) -> Option<Arc<dyn ErasedNode>> {
    let calculation = value.downcast::<T>().ok()?;
    Some(Arc::new(Node::from_shared(calculation)))
}

/// One entry of a dependency signature.
#[derive(Debug, Clone, Copy)]
pub struct Dependency {
    node_type: NodeType,
    blueprint: Option<Blueprint>,
    optional: bool,
}

impl Dependency {
    /// A calculation the engine discovers, builds, and executes.
    pub fn node<T: Calculation>() -> Self {
        Self {
            node_type: NodeType::of::<T>(),
            blueprint: Some(Blueprint::of::<T>()),
            optional: false,
        }
    }

    /// A value the caller supplies to the resolution pass.
    pub fn leaf<V: Send + Sync + 'static>() -> Self {
        Self {
            node_type: NodeType::of::<V>(),
            blueprint: None,
            optional: false,
        }
    }

    /// Allow the parameter to be empty when nothing supplies it.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether the declared type is a calculation the engine can build.
    pub fn is_calculation(&self) -> bool {
        self.blueprint.is_some()
    }

    pub(crate) fn blueprint(&self) -> Option<&Blueprint> {
        self.blueprint.as_ref()
    }
}
