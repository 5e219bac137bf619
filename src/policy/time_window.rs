//! Time-Windowed Primary Affinity
//!
//! Route a session's reads to the primary while its last write is younger
//! than the configured window, then back to the replicas. No node is
//! queried to make the decision.
//!
//! The window is a guess at replication speed: it over-routes to the
//! primary when replication is faster than the window and under-protects
//! when replication is slower. Exactness is the log-position policy's job.
//!
//! Replica selection rotates round-robin over configuration order, which
//! keeps the choice deterministic for a given call sequence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::errors::RouterResult;
use crate::node::{Node, NodeRegistry};
use crate::oracle::StalenessOracle;
use crate::policy::ConsistencyPolicy;
use crate::session::SessionState;

pub struct TimeWindowPolicy {
    window: Duration,
    clock: Arc<dyn Clock>,
    rotation: AtomicUsize,
}

impl TimeWindowPolicy {
    /// A zero window never routes reads to the primary. Negative windows
    /// cannot reach this point; configuration validation rejects them.
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            clock,
            rotation: AtomicUsize::new(0),
        }
    }

    fn within_window(&self, session: &SessionState) -> bool {
        match session.last_write_at() {
            Some(at) => self.clock.now().saturating_duration_since(at) < self.window,
            None => false,
        }
    }

    fn next_replica(&self, registry: &NodeRegistry) -> Option<Arc<Node>> {
        let replicas = registry.replicas();
        if replicas.is_empty() {
            return None;
        }
        let slot = self.rotation.fetch_add(1, Ordering::Relaxed) % replicas.len();
        Some(Arc::clone(&replicas[slot]))
    }
}

impl ConsistencyPolicy for TimeWindowPolicy {
    fn name(&self) -> &'static str {
        "time_window"
    }

    fn select_node_for_read(
        &self,
        _session_key: &str,
        session: &mut SessionState,
        registry: &NodeRegistry,
        _oracle: &StalenessOracle,
    ) -> RouterResult<Arc<Node>> {
        if self.within_window(session) {
            return Ok(Arc::clone(registry.primary()));
        }
        match self.next_replica(registry) {
            Some(replica) => Ok(replica),
            // Replica-less topology: the primary is the only read target.
            None => Ok(Arc::clone(registry.primary())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::position::LogPosition;
    use crate::store::MemoryCluster;
    use std::time::Instant;

    fn policy_with_clock(window_secs: u64) -> (TimeWindowPolicy, ManualClock) {
        let clock = ManualClock::new();
        let policy = TimeWindowPolicy::new(
            Duration::from_secs(window_secs),
            Arc::new(clock.clone()),
        );
        (policy, clock)
    }

    fn oracle() -> StalenessOracle {
        StalenessOracle::new(Duration::from_millis(100))
    }

    fn wrote_at(clock: &ManualClock) -> SessionState {
        let mut session = SessionState::new();
        session.record_write(clock.now(), LogPosition::new(0, 1));
        session
    }

    #[test]
    fn test_fresh_write_routes_to_primary() {
        let cluster = MemoryCluster::new(2);
        let registry = cluster.registry().unwrap();
        let (policy, clock) = policy_with_clock(5);
        let mut session = wrote_at(&clock);

        clock.advance(Duration::from_secs(1));
        let node = policy
            .select_node_for_read("alice", &mut session, &registry, &oracle())
            .unwrap();
        assert_eq!(node.id(), "primary");
    }

    #[test]
    fn test_expired_window_routes_to_replica() {
        let cluster = MemoryCluster::new(2);
        let registry = cluster.registry().unwrap();
        let (policy, clock) = policy_with_clock(5);
        let mut session = wrote_at(&clock);

        clock.advance(Duration::from_secs(6));
        let node = policy
            .select_node_for_read("alice", &mut session, &registry, &oracle())
            .unwrap();
        assert_ne!(node.id(), "primary");
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        // Elapsed == window is outside the window.
        let cluster = MemoryCluster::new(1);
        let registry = cluster.registry().unwrap();
        let (policy, clock) = policy_with_clock(5);
        let mut session = wrote_at(&clock);

        clock.advance(Duration::from_secs(5));
        let node = policy
            .select_node_for_read("alice", &mut session, &registry, &oracle())
            .unwrap();
        assert_eq!(node.id(), "replica-0");
    }

    #[test]
    fn test_no_prior_write_routes_to_replica() {
        let cluster = MemoryCluster::new(1);
        let registry = cluster.registry().unwrap();
        let (policy, _clock) = policy_with_clock(5);
        let mut session = SessionState::new();

        let node = policy
            .select_node_for_read("alice", &mut session, &registry, &oracle())
            .unwrap();
        assert_eq!(node.id(), "replica-0");
    }

    #[test]
    fn test_zero_window_never_routes_to_primary() {
        let cluster = MemoryCluster::new(1);
        let registry = cluster.registry().unwrap();
        let (policy, clock) = policy_with_clock(0);
        let mut session = SessionState::new();
        session.record_write(clock.now(), LogPosition::new(0, 1));

        let node = policy
            .select_node_for_read("alice", &mut session, &registry, &oracle())
            .unwrap();
        assert_eq!(node.id(), "replica-0");
    }

    #[test]
    fn test_replica_rotation_is_round_robin() {
        let cluster = MemoryCluster::new(3);
        let registry = cluster.registry().unwrap();
        let (policy, _clock) = policy_with_clock(5);
        let mut session = SessionState::new();

        let picks: Vec<String> = (0..6)
            .map(|_| {
                policy
                    .select_node_for_read("alice", &mut session, &registry, &oracle())
                    .unwrap()
                    .id()
                    .to_string()
            })
            .collect();
        assert_eq!(
            picks,
            vec![
                "replica-0",
                "replica-1",
                "replica-2",
                "replica-0",
                "replica-1",
                "replica-2"
            ]
        );
    }

    #[test]
    fn test_replica_less_topology_reads_from_primary() {
        let cluster = MemoryCluster::new(0);
        let registry = cluster.registry().unwrap();
        let (policy, _clock) = policy_with_clock(5);
        let mut session = SessionState::new();

        let node = policy
            .select_node_for_read("alice", &mut session, &registry, &oracle())
            .unwrap();
        assert_eq!(node.id(), "primary");
    }

    #[test]
    fn test_stale_instant_does_not_panic() {
        // A session instant ahead of the clock reads as zero elapsed.
        let cluster = MemoryCluster::new(1);
        let registry = cluster.registry().unwrap();
        let (policy, _clock) = policy_with_clock(5);

        let mut session = SessionState::new();
        session.record_write(
            Instant::now() + Duration::from_secs(60),
            LogPosition::new(0, 1),
        );
        let node = policy
            .select_node_for_read("alice", &mut session, &registry, &oracle())
            .unwrap();
        assert_eq!(node.id(), "primary");
    }
}
