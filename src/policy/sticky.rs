//! Sticky Hash Affinity
//!
//! Hash a session's key onto one replica and route every read there for
//! the session's lifetime. The session only ever observes one replica's
//! monotonically advancing state, so its reads never move backward in
//! time; freshness after its own writes is traded away.
//!
//! - The hash is SHA-256 over the key's UTF-8 bytes (first 8 digest bytes
//!   as a big-endian integer), so the same key lands on the same replica
//!   index in every process.
//! - The binding is write-once. A bound replica that later becomes
//!   permanently unreachable keeps failing the session's reads; automatic
//!   re-binding is deliberately not attempted here.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::errors::{RouterError, RouterResult};
use crate::node::{Node, NodeRegistry};
use crate::oracle::StalenessOracle;
use crate::policy::ConsistencyPolicy;
use crate::session::SessionState;

/// Deterministic, well-distributed hash of a session key.
pub fn stable_hash(session_key: &str) -> u64 {
    let digest = Sha256::digest(session_key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

#[derive(Debug, Default)]
pub struct StickyHashPolicy;

impl StickyHashPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Replica index a key hashes onto for a given replica count.
    pub fn replica_index(session_key: &str, replica_count: usize) -> Option<usize> {
        if replica_count == 0 {
            return None;
        }
        Some((stable_hash(session_key) % replica_count as u64) as usize)
    }
}

impl ConsistencyPolicy for StickyHashPolicy {
    fn name(&self) -> &'static str {
        "sticky_hash"
    }

    fn select_node_for_read(
        &self,
        session_key: &str,
        session: &mut SessionState,
        registry: &NodeRegistry,
        _oracle: &StalenessOracle,
    ) -> RouterResult<Arc<Node>> {
        if let Some(bound) = session.sticky_replica_id() {
            return registry.by_id(bound).cloned();
        }

        let index = Self::replica_index(session_key, registry.replica_count()).ok_or_else(
            || RouterError::configuration("sticky_hash routing requires at least one replica"),
        )?;
        let replica = &registry.replicas()[index];
        session.bind_sticky_replica(replica.id());
        Ok(Arc::clone(replica))
    }
}
