//! Staleness Oracle
//!
//! Answers one question: has a replica replayed the log at least up to a
//! target position?
//!
//! - Every answer comes from a live `replayed_position` query. The advisory
//!   cache on the node is refreshed as a side effect but is never the basis
//!   of a caught-up decision; a cache older than the current decision could
//!   produce a false "caught up".
//! - An absent target (no prior write observed) is trivially caught up.
//! - An unreachable replica surfaces `NodeUnavailable`; fallback behavior
//!   belongs to the policy, never to the oracle.

use std::time::Duration;

use crate::errors::{RouterError, RouterResult};
use crate::node::{Node, NodeRegistry};
use crate::position::LogPosition;

/// Per-replica lag observation, for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaLag {
    pub replica_id: String,
    /// Primary's end-of-log position at observation time
    pub current: LogPosition,
    /// Replica's replayed position; `None` when the replica was unreachable
    pub replayed: Option<LogPosition>,
    /// Record gap, when current and replayed sit in the same segment
    pub lag_records: Option<u64>,
}

impl ReplicaLag {
    pub fn is_reachable(&self) -> bool {
        self.replayed.is_some()
    }
}

/// Live staleness checker over the node clients.
#[derive(Debug, Clone, Copy)]
pub struct StalenessOracle {
    timeout: Duration,
}

impl StalenessOracle {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check whether `replica` has replayed at least up to `target`.
    ///
    /// Queries the replica live on every call.
    pub fn is_caught_up_to(
        &self,
        replica: &Node,
        target: Option<LogPosition>,
    ) -> RouterResult<bool> {
        let Some(target) = target else {
            return Ok(true);
        };

        let replayed = replica
            .client()
            .replayed_position(self.timeout)
            .map_err(|_| RouterError::node_unavailable(replica.id()))?;

        replica.note_position(replayed);
        Ok(replayed >= target)
    }

    /// Observe per-replica lag across the whole topology.
    ///
    /// The primary must answer (its position anchors the report); replicas
    /// that do not answer are reported as unreachable rather than failing
    /// the whole report.
    pub fn lag_report(&self, registry: &NodeRegistry) -> RouterResult<Vec<ReplicaLag>> {
        let primary = registry.primary();
        let current = primary
            .client()
            .current_position(self.timeout)
            .map_err(|_| RouterError::node_unavailable(primary.id()))?;
        primary.note_position(current);

        let mut report = Vec::with_capacity(registry.replica_count());
        for replica in registry.replicas() {
            let replayed = replica.client().replayed_position(self.timeout).ok();
            if let Some(position) = replayed {
                replica.note_position(position);
            }
            report.push(ReplicaLag {
                replica_id: replica.id().to_string(),
                current,
                replayed,
                lag_records: replayed.and_then(|p| current.records_since(&p)),
            });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCluster;

    fn oracle() -> StalenessOracle {
        StalenessOracle::new(Duration::from_millis(100))
    }

    #[test]
    fn test_absent_target_is_trivially_caught_up() {
        let cluster = MemoryCluster::new(1);
        let registry = cluster.registry().unwrap();
        let replica = &registry.replicas()[0];

        assert!(oracle().is_caught_up_to(replica, None).unwrap());
        // Trivial answer requires no query: cache stays untouched.
        assert!(replica.last_known_position().is_none());
    }

    #[test]
    fn test_caught_up_when_replayed_reaches_target() {
        let cluster = MemoryCluster::new(1);
        let registry = cluster.registry().unwrap();
        let primary = registry.primary();
        let replica = &registry.replicas()[0];

        primary
            .client()
            .execute("INSERT 1", Duration::from_millis(100))
            .unwrap();
        let target = primary
            .client()
            .current_position(Duration::from_millis(100))
            .unwrap();

        assert!(oracle().is_caught_up_to(replica, Some(target)).unwrap());
    }

    #[test]
    fn test_lagging_replica_is_not_caught_up() {
        let cluster = MemoryCluster::new(1);
        let registry = cluster.registry().unwrap();
        let primary = registry.primary();
        let replica = &registry.replicas()[0];

        cluster.hold_replica("replica-0");
        primary
            .client()
            .execute("INSERT 1", Duration::from_millis(100))
            .unwrap();
        let target = primary
            .client()
            .current_position(Duration::from_millis(100))
            .unwrap();

        assert!(!oracle().is_caught_up_to(replica, Some(target)).unwrap());

        cluster.release_replica("replica-0");
        assert!(oracle().is_caught_up_to(replica, Some(target)).unwrap());
    }

    #[test]
    fn test_query_refreshes_advisory_cache() {
        let cluster = MemoryCluster::new(1);
        let registry = cluster.registry().unwrap();
        let primary = registry.primary();
        let replica = &registry.replicas()[0];

        primary
            .client()
            .execute("INSERT 1", Duration::from_millis(100))
            .unwrap();
        oracle()
            .is_caught_up_to(replica, Some(LogPosition::new(0, 1)))
            .unwrap();

        assert_eq!(replica.last_known_position(), Some(LogPosition::new(0, 1)));
    }

    #[test]
    fn test_unreachable_replica_surfaces_node_unavailable() {
        let cluster = MemoryCluster::new(1);
        let registry = cluster.registry().unwrap();
        let replica = &registry.replicas()[0];

        cluster.set_replica_unreachable("replica-0", true);
        let result = oracle().is_caught_up_to(replica, Some(LogPosition::new(0, 1)));
        assert_eq!(
            result,
            Err(RouterError::node_unavailable("replica-0"))
        );
    }

    #[test]
    fn test_lag_report_counts_records_behind() {
        let cluster = MemoryCluster::new(2);
        let registry = cluster.registry().unwrap();

        cluster.hold_replica("replica-1");
        for i in 0..4 {
            registry
                .primary()
                .client()
                .execute(&format!("INSERT {i}"), Duration::from_millis(100))
                .unwrap();
        }

        let report = oracle().lag_report(&registry).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].replica_id, "replica-0");
        assert_eq!(report[0].lag_records, Some(0));
        assert_eq!(report[1].replica_id, "replica-1");
        assert_eq!(report[1].lag_records, Some(4));
    }

    #[test]
    fn test_lag_report_marks_unreachable_replicas() {
        let cluster = MemoryCluster::new(2);
        let registry = cluster.registry().unwrap();

        cluster.set_replica_unreachable("replica-0", true);
        let report = oracle().lag_report(&registry).unwrap();

        assert!(!report[0].is_reachable());
        assert_eq!(report[0].lag_records, None);
        assert!(report[1].is_reachable());
    }

    #[test]
    fn test_lag_report_fails_without_primary() {
        let cluster = MemoryCluster::new(1);
        let registry = cluster.registry().unwrap();

        cluster.set_primary_unreachable(true);
        assert_eq!(
            oracle().lag_report(&registry),
            Err(RouterError::node_unavailable("primary"))
        );
    }
}
