//! Read/Write Router
//!
//! The façade over the routing engine. Callers issue `write` and `read`
//! per session key; the router owns all session state, delegates node
//! choice to the active consistency policy, executes against the chosen
//! node and keeps the session's progress markers current.
//!
//! Invariants:
//! - Writes execute against the primary only and are never redirected.
//! - Session state updates happen on the write-completion path, under the
//!   per-session lock, before the call returns: a session always reads its
//!   own writes' markers (read-your-own-writes ordering holds regardless
//!   of which policy is active).
//! - A read that fails after node selection is surfaced with its routing
//!   context, never transparently re-routed; silent fallback would break
//!   whatever guarantee the caller asked for.
//! - No ordering is promised across sessions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::config::RouterConfig;
use crate::errors::{RouterError, RouterResult};
use crate::node::{Endpoint, Node, NodeRegistry, NodeRole};
use crate::observability;
use crate::oracle::{ReplicaLag, StalenessOracle};
use crate::policy::{build_policy, ConsistencyPolicy};
use crate::position::LogPosition;
use crate::session::{SessionState, SessionStore};
use crate::store::{NodeClient, Row, StoreError};

/// Produced by a completed write; seeds the policy's decision for the
/// session's subsequent reads.
#[derive(Debug, Clone, Copy)]
pub struct WriteRecord {
    /// Log position the primary reported after the write
    pub position: LogPosition,
    /// Monotonic completion instant (freshness-window anchor)
    pub at: Instant,
    /// Wall-clock completion time, for log lines and callers
    pub committed_at: DateTime<Utc>,
}

/// A routed read and the node that served it.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub rows: Vec<Row>,
    /// Which node answered; part of the result for observability
    pub node_id: String,
}

/// Builds a node client for an endpoint with a known role.
pub type Connector = dyn Fn(&Endpoint, NodeRole) -> Arc<dyn NodeClient>;

pub struct Router {
    registry: NodeRegistry,
    sessions: SessionStore,
    oracle: StalenessOracle,
    policy: Box<dyn ConsistencyPolicy>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl Router {
    /// Assemble a router over an existing registry.
    pub fn new(
        registry: NodeRegistry,
        policy: Box<dyn ConsistencyPolicy>,
        clock: Arc<dyn Clock>,
        node_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            sessions: SessionStore::new(),
            oracle: StalenessOracle::new(node_timeout),
            policy,
            clock,
            timeout: node_timeout,
        }
    }

    /// Build a router from validated configuration.
    ///
    /// Validation runs first: a bad configuration fails before the
    /// connector is invoked for any endpoint.
    pub fn from_config(
        config: &RouterConfig,
        clock: Arc<dyn Clock>,
        connect: &Connector,
    ) -> RouterResult<Self> {
        config.validate()?;

        let mut nodes = vec![Node::new(
            "primary",
            NodeRole::Primary,
            config.primary_endpoint.clone(),
            connect(&config.primary_endpoint, NodeRole::Primary),
        )];
        for (i, endpoint) in config.replica_endpoints.iter().enumerate() {
            nodes.push(Node::new(
                format!("replica-{i}"),
                NodeRole::Replica,
                endpoint.clone(),
                connect(endpoint, NodeRole::Replica),
            ));
        }

        let registry = NodeRegistry::new(nodes)?;
        let policy = build_policy(config, Arc::clone(&clock));
        Ok(Self::new(registry, policy, clock, config.node_timeout()))
    }

    /// Execute a write for a session. Primary only, never redirected.
    pub fn write(&self, session_key: &str, statement: &str) -> RouterResult<WriteRecord> {
        let primary = self.registry.primary();
        if primary.role() != NodeRole::Primary {
            return Err(RouterError::read_only_violation(primary.id()));
        }

        primary
            .client()
            .execute(statement, self.timeout)
            .map_err(|e| match e {
                StoreError::ReadOnly => RouterError::read_only_violation(primary.id()),
                other => {
                    if other.is_unavailable() {
                        observability::node_unreachable(primary.id());
                    }
                    RouterError::write(primary.id(), other.to_string())
                }
            })?;

        let position = primary
            .client()
            .current_position(self.timeout)
            .map_err(|e| {
                RouterError::write(
                    primary.id(),
                    format!("position query after write failed: {e}"),
                )
            })?;
        primary.note_position(position);

        let at = self.clock.now();
        let entry = self.sessions.entry(session_key);
        entry.lock().unwrap().record_write(at, position);

        observability::write_committed(session_key, primary.id(), position);
        Ok(WriteRecord {
            position,
            at,
            committed_at: Utc::now(),
        })
    }

    /// Execute a read for a session via the active policy.
    pub fn read(&self, session_key: &str, query: &str) -> RouterResult<ReadOutcome> {
        let entry = self.sessions.entry(session_key);
        let node = {
            let mut session = entry.lock().unwrap();
            self.policy.select_node_for_read(
                session_key,
                &mut session,
                &self.registry,
                &self.oracle,
            )?
        };

        let rows = node.client().query(query, self.timeout).map_err(|e| {
            if e.is_unavailable() {
                observability::node_unreachable(node.id());
            }
            RouterError::read(node.id(), self.policy.name(), session_key, e.to_string())
        })?;

        observability::route_decision(self.policy.name(), session_key, node.id(), rows.len());
        Ok(ReadOutcome {
            rows,
            node_id: node.id().to_string(),
        })
    }

    /// Observe per-replica lag across the topology, logging each entry.
    pub fn lag_report(&self) -> RouterResult<Vec<ReplicaLag>> {
        let report = self.oracle.lag_report(&self.registry)?;
        for lag in &report {
            observability::replica_lag(lag);
        }
        Ok(report)
    }

    /// Name of the active policy.
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Point-in-time copy of a session's state, if the session exists.
    pub fn session_snapshot(&self, session_key: &str) -> Option<SessionState> {
        self.sessions
            .get(session_key)
            .map(|entry| entry.lock().unwrap().clone())
    }
}
