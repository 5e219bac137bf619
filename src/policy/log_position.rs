//! Log-Position-Gated Routing
//!
//! A replica serves a session's read only if the oracle proves, with a
//! live query, that it has replayed up to the session's last write
//! position. No false-fresh reads, at the cost of one extra round trip
//! per read.
//!
//! Fallback scan:
//! - Replicas are tried in registry (configuration) order.
//! - An unreachable replica counts as not caught up; the scan continues.
//! - All replicas lagging or unreachable falls back to the primary, which
//!   by definition has the write.

use std::sync::Arc;

use crate::errors::{RouterError, RouterResult};
use crate::node::{Node, NodeRegistry};
use crate::oracle::StalenessOracle;
use crate::policy::ConsistencyPolicy;
use crate::session::SessionState;

#[derive(Debug, Default)]
pub struct LogPositionPolicy;

impl LogPositionPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl ConsistencyPolicy for LogPositionPolicy {
    fn name(&self) -> &'static str {
        "log_position"
    }

    fn select_node_for_read(
        &self,
        _session_key: &str,
        session: &mut SessionState,
        registry: &NodeRegistry,
        oracle: &StalenessOracle,
    ) -> RouterResult<Arc<Node>> {
        let target = session.last_write_position();

        // No prior write: nothing to be stale against.
        if target.is_none() {
            return Ok(registry
                .replicas()
                .first()
                .unwrap_or(registry.primary())
                .clone());
        }

        for replica in registry.replicas() {
            match oracle.is_caught_up_to(replica, target) {
                Ok(true) => return Ok(Arc::clone(replica)),
                Ok(false) => continue,
                Err(RouterError::NodeUnavailable { .. }) => continue,
                Err(other) => return Err(other),
            }
        }

        Ok(Arc::clone(registry.primary()))
    }
}
