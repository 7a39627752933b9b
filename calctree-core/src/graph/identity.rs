//! Node Identity
//!
//! Every calculation type and every supplied input type is keyed by a
//! [`NodeType`]: the Rust `TypeId` of the type, carried together with its
//! type name so errors and reports can say which type they mean.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable identity of a type taking part in a dependency graph.
///
/// Equality and hashing only look at the `TypeId`. The name is for humans.
#[derive(Clone, Copy)]
pub struct NodeType {
    id: TypeId,
    name: &'static str,
}

impl NodeType {
    /// Identity of the type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, e.g. `my_crate::pricing::Total`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path, e.g. `Total`.
    ///
    /// Generic arguments are kept as written, so `Vec<my_crate::Price>`
    /// stays `Vec<my_crate::Price>`.
    pub fn short_name(&self) -> &'static str {
        let head = match self.name.find('<') {
            Some(generic_start) => &self.name[..generic_start],
            None => self.name,
        };
        match head.rfind("::") {
            Some(separator) => &self.name[separator + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NodeType {}

impl Hash for NodeType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
