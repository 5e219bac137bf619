//! # Router Errors
//!
//! Error taxonomy for the routing engine.
//!
//! - Configuration errors are fatal at startup and raised before any node
//!   is contacted.
//! - `NodeUnavailable` is recoverable by a policy (try another node, fall
//!   back to primary), never silently retried by the oracle or registry.
//! - Writes have no fallback target; write failures surface verbatim.
//! - A read failure after node selection is surfaced, never transparently
//!   re-routed: a policy-driven re-route is an explicit new routing
//!   decision, not an error-driven fallback.

use thiserror::Error;

/// Result type for routing operations
pub type RouterResult<T> = Result<T, RouterError>;

/// Routing engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    // ==================
    // Startup Errors
    // ==================
    /// Invalid or missing topology / policy parameters
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Registry lookup for an unknown node id
    #[error("unknown node '{node_id}'")]
    UnknownNode { node_id: String },

    // ==================
    // Node Errors
    // ==================
    /// Node did not respond within the timeout or the connection failed
    #[error("node '{node_id}' is unavailable")]
    NodeUnavailable { node_id: String },

    /// A write reached a read-only node; indicates a routing bug upstream
    #[error("write attempted against read-only node '{node_id}'")]
    ReadOnlyViolation { node_id: String },

    // ==================
    // Operation Errors
    // ==================
    /// Primary rejected or failed to execute a write
    #[error("write failed on primary '{node_id}': {message}")]
    Write { node_id: String, message: String },

    /// The chosen node failed mid-query after being selected
    #[error(
        "read failed on node '{node_id}' (policy '{policy}', session '{session}'): {message}"
    )]
    Read {
        node_id: String,
        policy: String,
        session: String,
        message: String,
    },
}

impl RouterError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unknown-node error.
    pub fn unknown_node(node_id: impl Into<String>) -> Self {
        Self::UnknownNode {
            node_id: node_id.into(),
        }
    }

    /// Create a node-unavailable error.
    pub fn node_unavailable(node_id: impl Into<String>) -> Self {
        Self::NodeUnavailable {
            node_id: node_id.into(),
        }
    }

    /// Create a read-only violation error.
    pub fn read_only_violation(node_id: impl Into<String>) -> Self {
        Self::ReadOnlyViolation {
            node_id: node_id.into(),
        }
    }

    /// Create a write error.
    pub fn write(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Create a read error with full routing context.
    pub fn read(
        node_id: impl Into<String>,
        policy: impl Into<String>,
        session: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Read {
            node_id: node_id.into(),
            policy: policy.into(),
            session: session.into(),
            message: message.into(),
        }
    }

    /// Check if this error is fatal (startup must abort).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Check if this error is recoverable by policy fallback.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NodeUnavailable { .. })
    }
}
