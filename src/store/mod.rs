//! External Store Contract
//!
//! The replicated store (one writable primary, N read-only replicas fed by
//! an asynchronous log stream) is an external collaborator. The router sees
//! each node through the `NodeClient` capability and nothing else:
//! connection establishment, pooling and the replication protocol itself
//! live on the other side of this trait.
//!
//! - Every call carries a caller-supplied timeout; a timed-out call is
//!   indistinguishable from an unreachable node.
//! - Replicas fail writes with `StoreError::ReadOnly`.
//! - Position queries are role-specific: `current_position` answers on the
//!   primary, `replayed_position` on a replica.

mod memory;

pub use memory::{MemoryCluster, MemoryClusterOptions};

use std::time::Duration;

use thiserror::Error;

use crate::node::NodeRole;
use crate::position::LogPosition;

/// One result row: an ordered list of cells.
pub type Row = Vec<serde_json::Value>;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a store node
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Connection failed or node is down
    #[error("node unavailable")]
    Unavailable,

    /// Call did not complete within the timeout
    #[error("call timed out")]
    Timeout,

    /// Write attempted against a read-only node
    #[error("node is read-only")]
    ReadOnly,

    /// Node answered but refused the operation
    #[error("rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    /// Timeouts and connection failures are the same condition to callers.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Timeout)
    }
}

/// Capability a single store node exposes to the router.
///
/// Implementations must be safe to share across concurrent sessions.
pub trait NodeClient: Send + Sync {
    /// Execute a write statement. Primary only; replicas return `ReadOnly`.
    fn execute(&self, statement: &str, timeout: Duration) -> StoreResult<u64>;

    /// Run a read query. Any node.
    fn query(&self, sql: &str, timeout: Duration) -> StoreResult<Vec<Row>>;

    /// Current end-of-log position. Primary only.
    fn current_position(&self, timeout: Duration) -> StoreResult<LogPosition>;

    /// Last replayed log position. Replica only.
    fn replayed_position(&self, timeout: Duration) -> StoreResult<LogPosition>;

    /// The role this node was configured with.
    fn role(&self) -> NodeRole;
}
