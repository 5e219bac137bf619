//! In-Memory Replicated Cluster
//!
//! A deterministic stand-in for a real primary-replica store, used by the
//! test suites, the demo walkthrough and the benchmark harness. It models
//! exactly the surface the router cares about: an append-only statement log
//! on the primary and a per-replica replay cursor that can be held back,
//! advanced record by record, or released to catch up, plus per-node
//! unreachability.
//!
//! Lag here is injected explicitly instead of by bulk-loading a real store:
//! a held replica stays at its cursor no matter how far the primary log
//! grows, which makes "replica is N records behind" a statement the tests
//! can rely on.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use crate::errors::RouterResult;
use crate::node::{Endpoint, Node, NodeRegistry, NodeRole};
use crate::position::LogPosition;
use crate::store::{NodeClient, Row, StoreError, StoreResult};

/// Tuning for a memory cluster.
#[derive(Debug, Clone)]
pub struct MemoryClusterOptions {
    /// Number of replicas to create
    pub replica_count: usize,
    /// When false, replicas never advance on their own; every record must be
    /// applied via `advance_replica` or `release_replica`.
    pub auto_replicate: bool,
}

impl Default for MemoryClusterOptions {
    fn default() -> Self {
        Self {
            replica_count: 2,
            auto_replicate: true,
        }
    }
}

struct ReplicaState {
    applied: u64,
    held: bool,
    unreachable: bool,
}

struct ClusterState {
    log: Vec<String>,
    replicas: BTreeMap<String, ReplicaState>,
    primary_unreachable: bool,
    auto_replicate: bool,
}

impl ClusterState {
    fn end_of_log(&self) -> LogPosition {
        LogPosition::new(0, self.log.len() as u64)
    }
}

/// Shared in-memory cluster handle. Cloning shares the same cluster.
#[derive(Clone)]
pub struct MemoryCluster {
    shared: Arc<Mutex<ClusterState>>,
    replica_ids: Vec<String>,
}

impl MemoryCluster {
    /// Create a cluster with `replica_count` replicas that replicate
    /// instantly on every write.
    pub fn new(replica_count: usize) -> Self {
        Self::with_options(MemoryClusterOptions {
            replica_count,
            ..MemoryClusterOptions::default()
        })
    }

    pub fn with_options(options: MemoryClusterOptions) -> Self {
        let mut replicas = BTreeMap::new();
        let mut replica_ids = Vec::new();
        for i in 0..options.replica_count {
            let id = format!("replica-{i}");
            replicas.insert(
                id.clone(),
                ReplicaState {
                    applied: 0,
                    held: false,
                    unreachable: false,
                },
            );
            replica_ids.push(id);
        }
        Self {
            shared: Arc::new(Mutex::new(ClusterState {
                log: Vec::new(),
                replicas,
                primary_unreachable: false,
                auto_replicate: options.auto_replicate,
            })),
            replica_ids,
        }
    }

    /// Ids of the cluster's replicas, in creation order.
    pub fn replica_ids(&self) -> &[String] {
        &self.replica_ids
    }

    /// Client handle for the primary.
    pub fn primary_client(&self) -> Arc<dyn NodeClient> {
        Arc::new(MemoryNodeClient {
            shared: Arc::clone(&self.shared),
            target: Target::Primary,
        })
    }

    /// Client handle for one replica.
    pub fn replica_client(&self, replica_id: &str) -> Arc<dyn NodeClient> {
        Arc::new(MemoryNodeClient {
            shared: Arc::clone(&self.shared),
            target: Target::Replica(replica_id.to_string()),
        })
    }

    /// Freeze a replica's replay cursor at its current record.
    pub fn hold_replica(&self, replica_id: &str) {
        let mut state = self.shared.lock().unwrap();
        if let Some(replica) = state.replicas.get_mut(replica_id) {
            replica.held = true;
        }
    }

    /// Apply up to `records` further log records on a held replica.
    pub fn advance_replica(&self, replica_id: &str, records: u64) {
        let mut state = self.shared.lock().unwrap();
        let end = state.log.len() as u64;
        if let Some(replica) = state.replicas.get_mut(replica_id) {
            replica.applied = (replica.applied + records).min(end);
        }
    }

    /// Unfreeze a replica and let it catch up to the end of the log.
    pub fn release_replica(&self, replica_id: &str) {
        let mut state = self.shared.lock().unwrap();
        let end = state.log.len() as u64;
        if let Some(replica) = state.replicas.get_mut(replica_id) {
            replica.held = false;
            replica.applied = end;
        }
    }

    /// Mark a replica reachable or unreachable.
    pub fn set_replica_unreachable(&self, replica_id: &str, unreachable: bool) {
        let mut state = self.shared.lock().unwrap();
        if let Some(replica) = state.replicas.get_mut(replica_id) {
            replica.unreachable = unreachable;
        }
    }

    /// Mark the primary reachable or unreachable.
    pub fn set_primary_unreachable(&self, unreachable: bool) {
        self.shared.lock().unwrap().primary_unreachable = unreachable;
    }

    /// Number of records committed on the primary.
    pub fn committed_records(&self) -> u64 {
        self.shared.lock().unwrap().log.len() as u64
    }

    /// Build a registry over this cluster: one primary plus the replicas in
    /// creation order, with tutorial-style local endpoints.
    pub fn registry(&self) -> RouterResult<NodeRegistry> {
        let mut nodes = vec![Node::new(
            "primary",
            NodeRole::Primary,
            Endpoint::new("localhost", 5432),
            self.primary_client(),
        )];
        for (i, id) in self.replica_ids.iter().enumerate() {
            nodes.push(Node::new(
                id.clone(),
                NodeRole::Replica,
                Endpoint::new("localhost", 5433 + i as u16),
                self.replica_client(id),
            ));
        }
        NodeRegistry::new(nodes)
    }
}

enum Target {
    Primary,
    Replica(String),
}

struct MemoryNodeClient {
    shared: Arc<Mutex<ClusterState>>,
    target: Target,
}

impl MemoryNodeClient {
    fn visible_rows(log: &[String], upto: u64) -> Vec<Row> {
        log.iter()
            .take(upto as usize)
            .enumerate()
            .map(|(i, statement)| vec![json!(i as u64), json!(statement)])
            .collect()
    }
}

impl NodeClient for MemoryNodeClient {
    fn execute(&self, statement: &str, _timeout: Duration) -> StoreResult<u64> {
        let mut state = self.shared.lock().unwrap();
        match &self.target {
            Target::Primary => {
                if state.primary_unreachable {
                    return Err(StoreError::Unavailable);
                }
                state.log.push(statement.to_string());
                let end = state.log.len() as u64;
                if state.auto_replicate {
                    for replica in state.replicas.values_mut() {
                        if !replica.held {
                            replica.applied = end;
                        }
                    }
                }
                Ok(1)
            }
            Target::Replica(id) => {
                let replica = state
                    .replicas
                    .get(id)
                    .ok_or(StoreError::Unavailable)?;
                if replica.unreachable {
                    return Err(StoreError::Unavailable);
                }
                Err(StoreError::ReadOnly)
            }
        }
    }

    fn query(&self, _sql: &str, _timeout: Duration) -> StoreResult<Vec<Row>> {
        let state = self.shared.lock().unwrap();
        match &self.target {
            Target::Primary => {
                if state.primary_unreachable {
                    return Err(StoreError::Unavailable);
                }
                Ok(Self::visible_rows(&state.log, state.log.len() as u64))
            }
            Target::Replica(id) => {
                let replica = state.replicas.get(id).ok_or(StoreError::Unavailable)?;
                if replica.unreachable {
                    return Err(StoreError::Unavailable);
                }
                Ok(Self::visible_rows(&state.log, replica.applied))
            }
        }
    }

    fn current_position(&self, _timeout: Duration) -> StoreResult<LogPosition> {
        let state = self.shared.lock().unwrap();
        match &self.target {
            Target::Primary => {
                if state.primary_unreachable {
                    return Err(StoreError::Unavailable);
                }
                Ok(state.end_of_log())
            }
            Target::Replica(_) => Err(StoreError::Rejected(
                "current_position answers on the primary only".to_string(),
            )),
        }
    }

    fn replayed_position(&self, _timeout: Duration) -> StoreResult<LogPosition> {
        let state = self.shared.lock().unwrap();
        match &self.target {
            Target::Primary => Err(StoreError::Rejected(
                "replayed_position answers on a replica only".to_string(),
            )),
            Target::Replica(id) => {
                let replica = state.replicas.get(id).ok_or(StoreError::Unavailable)?;
                if replica.unreachable {
                    return Err(StoreError::Unavailable);
                }
                Ok(LogPosition::new(0, replica.applied))
            }
        }
    }

    fn role(&self) -> NodeRole {
        match self.target {
            Target::Primary => NodeRole::Primary,
            Target::Replica(_) => NodeRole::Replica,
        }
    }
}
