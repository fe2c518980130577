//! Engine configuration
//!
//! Limits and policies for metadata discovery, parsing, pagination and
//! operator registration.

use serde::{Deserialize, Serialize};

/// What happens when an operator is registered under a taken name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperatorCollisionPolicy {
    /// Replace the previous operator and log a warning
    #[default]
    Override,
    /// Fail with `OperatorConflict`
    Reject,
}

/// Engine configuration for [`SearchEngine`](crate::SearchEngine)
///
/// ```rust
/// use entity_search::{EngineConfig, OperatorCollisionPolicy};
///
/// let config = EngineConfig::default()
///     .with_max_discovery_depth(2)
///     .with_page_sizes(50, 500)
///     .with_collision_policy(OperatorCollisionPolicy::Reject);
/// assert_eq!(config.default_page_size, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Maximum number of relation or embedded hops followed while building
    /// a catalog entry. Default: 4
    pub max_discovery_depth: usize,

    /// Maximum nesting of filter expressions. Default: 64
    pub max_expression_depth: usize,

    /// Page size used when a request names none. Default: 20
    pub default_page_size: usize,

    /// Upper bound for requested page sizes. Default: 1000
    pub max_page_size: usize,

    /// Behaviour on duplicate operator names. Default: override
    pub collision_policy: OperatorCollisionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_discovery_depth: 4,
            max_expression_depth: 64,
            default_page_size: 20,
            max_page_size: 1000,
            collision_policy: OperatorCollisionPolicy::Override,
        }
    }
}

impl EngineConfig {
    /// Create new configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the catalog traversal depth limit
    pub fn with_max_discovery_depth(mut self, depth: usize) -> Self {
        self.max_discovery_depth = depth;
        self
    }

    /// Set the filter nesting limit
    pub fn with_max_expression_depth(mut self, depth: usize) -> Self {
        self.max_expression_depth = depth;
        self
    }

    /// Set the default and maximum page sizes; the default is capped by
    /// the maximum and both are at least 1
    pub fn with_page_sizes(mut self, default_size: usize, max_size: usize) -> Self {
        self.max_page_size = max_size.max(1);
        self.default_page_size = default_size.clamp(1, self.max_page_size);
        self
    }

    pub fn with_collision_policy(mut self, policy: OperatorCollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }
}
