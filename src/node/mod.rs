//! Nodes and the Node Registry
//!
//! Topology is static: nodes are created once at startup from configuration
//! and never rebalanced mid-run.
//!
//! Invariants:
//! - Exactly one primary; zero or multiple primaries is a configuration
//!   error at construction.
//! - Replica order is configuration order and is stable; sticky hashing and
//!   fallback scans depend on it.
//! - The registry is immutable after construction and shared read-only
//!   across sessions. The only mutable field on a node is the advisory
//!   `last_known_position` cache, which never feeds a routing decision.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::errors::{RouterError, RouterResult};
use crate::position::LogPosition;
use crate::store::NodeClient;

/// Node role within the replicated topology.
///
/// A node is either the primary (creates history) or a replica (replays
/// history). The role is configured externally, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Sole write authority; source of the replication log
    Primary,
    /// Read-only follower replaying the primary's log
    Replica,
}

impl NodeRole {
    /// Role name for log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Replica => "replica",
        }
    }
}

/// Opaque connection target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One physical connection target.
pub struct Node {
    id: String,
    role: NodeRole,
    endpoint: Endpoint,
    client: Arc<dyn NodeClient>,
    /// Advisory cache of the node's last observed position. Refreshed on
    /// demand, read for observability only; staleness decisions always
    /// re-query the node.
    last_known_position: Mutex<Option<LogPosition>>,
}

impl Node {
    /// Create a node. The id must be unique within the registry.
    pub fn new(
        id: impl Into<String>,
        role: NodeRole,
        endpoint: Endpoint,
        client: Arc<dyn NodeClient>,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            endpoint,
            client,
            last_known_position: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn client(&self) -> &dyn NodeClient {
        self.client.as_ref()
    }

    /// Last position observed for this node, if any was ever recorded.
    pub fn last_known_position(&self) -> Option<LogPosition> {
        *self.last_known_position.lock().unwrap()
    }

    /// Record a freshly observed position in the advisory cache.
    pub fn note_position(&self, position: LogPosition) {
        *self.last_known_position.lock().unwrap() = Some(position);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Static topology: one primary plus ordered replicas.
#[derive(Debug)]
pub struct NodeRegistry {
    primary: Arc<Node>,
    replicas: Vec<Arc<Node>>,
    by_id: HashMap<String, Arc<Node>>,
}

impl NodeRegistry {
    /// Build a registry from the configured nodes.
    ///
    /// Fails with a configuration error unless exactly one primary is
    /// present and all node ids are unique. Replica order is preserved.
    pub fn new(nodes: Vec<Node>) -> RouterResult<Self> {
        let mut primary: Option<Arc<Node>> = None;
        let mut replicas = Vec::new();
        let mut by_id: HashMap<String, Arc<Node>> = HashMap::new();

        for node in nodes {
            let node = Arc::new(node);
            if by_id.contains_key(node.id()) {
                return Err(RouterError::configuration(format!(
                    "duplicate node id '{}'",
                    node.id()
                )));
            }
            by_id.insert(node.id().to_string(), Arc::clone(&node));

            match node.role() {
                NodeRole::Primary => {
                    if primary.is_some() {
                        return Err(RouterError::configuration(
                            "more than one primary configured",
                        ));
                    }
                    primary = Some(node);
                }
                NodeRole::Replica => replicas.push(node),
            }
        }

        let primary = primary
            .ok_or_else(|| RouterError::configuration("no primary configured"))?;

        Ok(Self {
            primary,
            replicas,
            by_id,
        })
    }

    /// The single writable node.
    pub fn primary(&self) -> &Arc<Node> {
        &self.primary
    }

    /// Replicas in configuration order.
    pub fn replicas(&self) -> &[Arc<Node>] {
        &self.replicas
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    /// Look a node up by id.
    pub fn by_id(&self, node_id: &str) -> RouterResult<&Arc<Node>> {
        self.by_id
            .get(node_id)
            .ok_or_else(|| RouterError::unknown_node(node_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Row, StoreError, StoreResult};
    use std::time::Duration;

    struct StubClient {
        role: NodeRole,
    }

    impl NodeClient for StubClient {
        fn execute(&self, _statement: &str, _timeout: Duration) -> StoreResult<u64> {
            Err(StoreError::Rejected("stub".to_string()))
        }
        fn query(&self, _sql: &str, _timeout: Duration) -> StoreResult<Vec<Row>> {
            Ok(Vec::new())
        }
        fn current_position(&self, _timeout: Duration) -> StoreResult<LogPosition> {
            Ok(LogPosition::genesis())
        }
        fn replayed_position(&self, _timeout: Duration) -> StoreResult<LogPosition> {
            Ok(LogPosition::genesis())
        }
        fn role(&self) -> NodeRole {
            self.role
        }
    }

    fn node(id: &str, role: NodeRole, port: u16) -> Node {
        Node::new(
            id,
            role,
            Endpoint::new("localhost", port),
            Arc::new(StubClient { role }),
        )
    }

    #[test]
    fn test_registry_requires_exactly_one_primary() {
        let result = NodeRegistry::new(vec![node("r0", NodeRole::Replica, 5433)]);
        assert!(matches!(result, Err(RouterError::Configuration { .. })));

        let result = NodeRegistry::new(vec![
            node("p0", NodeRole::Primary, 5432),
            node("p1", NodeRole::Primary, 5435),
        ]);
        assert!(matches!(result, Err(RouterError::Configuration { .. })));
    }

    #[test]
    fn test_registry_rejects_duplicate_ids() {
        let result = NodeRegistry::new(vec![
            node("primary", NodeRole::Primary, 5432),
            node("primary", NodeRole::Replica, 5433),
        ]);
        assert!(matches!(result, Err(RouterError::Configuration { .. })));
    }

    #[test]
    fn test_replicas_keep_configuration_order() {
        let registry = NodeRegistry::new(vec![
            node("replica-1", NodeRole::Replica, 5434),
            node("primary", NodeRole::Primary, 5432),
            node("replica-0", NodeRole::Replica, 5433),
        ])
        .unwrap();

        assert_eq!(registry.primary().id(), "primary");
        let order: Vec<&str> = registry.replicas().iter().map(|n| n.id()).collect();
        assert_eq!(order, vec!["replica-1", "replica-0"]);
    }

    #[test]
    fn test_by_id_lookup() {
        let registry = NodeRegistry::new(vec![
            node("primary", NodeRole::Primary, 5432),
            node("replica-0", NodeRole::Replica, 5433),
        ])
        .unwrap();

        assert_eq!(registry.by_id("replica-0").unwrap().id(), "replica-0");
        assert!(matches!(
            registry.by_id("replica-9"),
            Err(RouterError::UnknownNode { .. })
        ));
    }

    #[test]
    fn test_position_cache_starts_empty() {
        let n = node("replica-0", NodeRole::Replica, 5433);
        assert!(n.last_known_position().is_none());

        n.note_position(LogPosition::new(0, 42));
        assert_eq!(n.last_known_position(), Some(LogPosition::new(0, 42)));
    }

    #[test]
    fn test_zero_replicas_is_a_valid_topology() {
        let registry = NodeRegistry::new(vec![node("primary", NodeRole::Primary, 5432)]).unwrap();
        assert_eq!(registry.replica_count(), 0);
    }
}
