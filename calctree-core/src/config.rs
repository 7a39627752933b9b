//! Tree configuration
//!
//! Settings that change how a [`CalculationTree`](crate::calc::CalculationTree)
//! discovers and resolves its graph. The defaults reproduce the engine's
//! historical behaviour, so most callers never build one by hand.

use serde::{Deserialize, Serialize};

/// How discovery treats a calculation type whose dependency signature is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDependencyPolicy {
    /// The type is an input and must be supplied by the caller.
    #[default]
    Leaf,

    /// The type is built and calculated by the engine with no arguments.
    Computed,
}

/// Configuration for a calculation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub zero_dependency_policy: ZeroDependencyPolicy,

    /// Log a warning when a pass was given inputs no node asked for.
    pub warn_on_unused_inputs: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            zero_dependency_policy: ZeroDependencyPolicy::Leaf,
            warn_on_unused_inputs: true,
        }
    }
}

impl TreeConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_zero_dependency_policy(mut self, policy: ZeroDependencyPolicy) -> Self {
        self.zero_dependency_policy = policy;
        self
    }

    pub fn with_warn_on_unused_inputs(mut self, warn: bool) -> Self {
        self.warn_on_unused_inputs = warn;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_treat_empty_signatures_as_leaves() {
        let config = TreeConfig::default();
        assert_eq!(config.zero_dependency_policy, ZeroDependencyPolicy::Leaf);
        assert!(config.warn_on_unused_inputs);
    }

    #[test]
    fn parses_partial_json() {
        let config = TreeConfig::from_json(r#"{ "zero_dependency_policy": "computed" }"#).unwrap();
        assert_eq!(config.zero_dependency_policy, ZeroDependencyPolicy::Computed);
        assert!(config.warn_on_unused_inputs);

        let empty = TreeConfig::from_json("{}").unwrap();
        assert_eq!(empty, TreeConfig::default());
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(TreeConfig::from_json(r#"{ "zero_dependency_policy": "lazy" }"#).is_err());
    }
}
