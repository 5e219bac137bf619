//! Benchmark Harness
//!
//! Measurement wrapper comparing the three consistency policies over the
//! same in-memory cluster shape and workload. Not part of routing
//! correctness; it exists to make the policies' trade-offs visible:
//! time-window routing pays nothing per read, log-position routing pays an
//! extra position query, sticky routing pays nothing but may serve stale
//! rows.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::clock::SystemClock;
use crate::errors::RouterResult;
use crate::policy::{ConsistencyPolicy, LogPositionPolicy, StickyHashPolicy, TimeWindowPolicy};
use crate::router::Router;
use crate::store::MemoryCluster;

/// Workload shape for one harness run.
#[derive(Debug, Clone)]
pub struct BenchmarkOptions {
    pub sessions: usize,
    pub writes_per_session: usize,
    pub reads_per_session: usize,
    pub replica_count: usize,
    /// Replicas (taken from the front of the replica list) held at zero
    /// replay for the whole run, so the policies face real lag.
    pub lagging_replicas: usize,
    pub write_window: Duration,
    pub node_timeout: Duration,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            sessions: 8,
            writes_per_session: 5,
            reads_per_session: 20,
            replica_count: 2,
            lagging_replicas: 1,
            write_window: Duration::from_secs(5),
            node_timeout: Duration::from_millis(100),
        }
    }
}

/// Latency and routing profile of one policy over the workload.
#[derive(Debug, Clone)]
pub struct PolicyReport {
    pub policy: &'static str,
    pub operations: usize,
    pub total: Duration,
    pub mean: Duration,
    pub max: Duration,
    pub primary_reads: usize,
    pub replica_reads: usize,
}

impl fmt::Display for PolicyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<13} {:>6} ops  total {:>10.1?}  mean {:>9.1?}  max {:>9.1?}  reads primary/replica {}/{}",
            self.policy,
            self.operations,
            self.total,
            self.mean,
            self.max,
            self.primary_reads,
            self.replica_reads
        )
    }
}

pub struct BenchmarkHarness {
    options: BenchmarkOptions,
}

impl BenchmarkHarness {
    pub fn new(options: BenchmarkOptions) -> Self {
        Self { options }
    }

    /// Run the workload once per policy, each over a fresh cluster.
    pub fn run(&self) -> RouterResult<Vec<PolicyReport>> {
        let window = self.options.write_window;
        let policies: Vec<Box<dyn Fn() -> Box<dyn ConsistencyPolicy>>> = vec![
            Box::new(move || {
                Box::new(TimeWindowPolicy::new(window, Arc::new(SystemClock)))
            }),
            Box::new(|| Box::new(LogPositionPolicy::new())),
            Box::new(|| Box::new(StickyHashPolicy::new())),
        ];

        let mut reports = Vec::with_capacity(policies.len());
        for make_policy in policies {
            reports.push(self.run_policy(make_policy())?);
        }
        Ok(reports)
    }

    fn run_policy(&self, policy: Box<dyn ConsistencyPolicy>) -> RouterResult<PolicyReport> {
        let opts = &self.options;
        let cluster = MemoryCluster::new(opts.replica_count);
        for id in cluster.replica_ids().iter().take(opts.lagging_replicas) {
            cluster.hold_replica(id);
        }

        let policy_name = policy.name();
        let router = Router::new(
            cluster.registry()?,
            policy,
            Arc::new(SystemClock),
            opts.node_timeout,
        );

        let mut operations = 0usize;
        let mut total = Duration::ZERO;
        let mut max = Duration::ZERO;
        let mut primary_reads = 0usize;
        let mut replica_reads = 0usize;

        for _ in 0..opts.sessions {
            let session_key = Uuid::new_v4().to_string();

            for i in 0..opts.writes_per_session {
                let started = Instant::now();
                router.write(&session_key, &format!("INSERT bench-{i}"))?;
                let elapsed = started.elapsed();
                operations += 1;
                total += elapsed;
                max = max.max(elapsed);
            }

            for _ in 0..opts.reads_per_session {
                let started = Instant::now();
                let outcome = router.read(&session_key, "SELECT *")?;
                let elapsed = started.elapsed();
                operations += 1;
                total += elapsed;
                max = max.max(elapsed);
                if outcome.node_id == router.registry().primary().id() {
                    primary_reads += 1;
                } else {
                    replica_reads += 1;
                }
            }
        }

        Ok(PolicyReport {
            policy: policy_name,
            operations,
            total,
            mean: total / operations.max(1) as u32,
            max,
            primary_reads,
            replica_reads,
        })
    }
}
