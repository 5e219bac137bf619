//! CLI command implementations
//!
//! The demo and bench commands run against the in-memory cluster so the
//! routing behavior is observable without standing up a real replicated
//! store; validate touches no node at all.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::bench::{BenchmarkHarness, BenchmarkOptions};
use crate::clock::SystemClock;
use crate::config::{PolicyKind, RouterConfig};
use crate::node::{Endpoint, NodeRole};
use crate::router::Router;
use crate::store::{MemoryCluster, NodeClient};

use super::args::{Cli, Command};
use super::errors::{CliError, CliErrorCode, CliResult};

/// Dispatch a parsed command.
pub fn run_command(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Validate { config } => validate(&config),
        Command::Demo { policy } => demo(&policy),
        Command::Bench {
            sessions,
            writes,
            reads,
        } => bench(sessions, writes, reads),
    }
}

/// Parse and validate a configuration file. Touches no node.
pub fn validate(config_path: &Path) -> CliResult<()> {
    let config = RouterConfig::load(config_path)?;
    println!(
        "configuration OK: primary {} with {} replica(s), policy {}, node timeout {}ms",
        config.primary_endpoint,
        config.replica_endpoints.len(),
        config.consistency_policy.as_str(),
        config.stale_connection_timeout_millis
    );
    Ok(())
}

fn parse_policy(raw: &str) -> CliResult<PolicyKind> {
    match raw {
        "time_window" => Ok(PolicyKind::TimeWindow),
        "log_position" => Ok(PolicyKind::LogPosition),
        "sticky_hash" => Ok(PolicyKind::StickyHash),
        other => Err(CliError::new(
            CliErrorCode::ArgumentError,
            format!(
                "unknown policy '{other}' (expected time_window, log_position or sticky_hash)"
            ),
        )),
    }
}

/// Walk one policy through a write-then-read sequence against a cluster
/// whose replicas are held behind, then released.
pub fn demo(policy: &str) -> CliResult<()> {
    let kind = parse_policy(policy)?;

    let cluster = MemoryCluster::new(2);
    let mut config = RouterConfig::new(Endpoint::new("localhost", 5432));
    config.replica_endpoints = vec![
        Endpoint::new("localhost", 5433),
        Endpoint::new("localhost", 5434),
    ];
    config.consistency_policy = kind;
    config.write_window_seconds = 2;

    let connector = {
        let cluster = cluster.clone();
        move |endpoint: &Endpoint, role: NodeRole| -> Arc<dyn NodeClient> {
            match role {
                NodeRole::Primary => cluster.primary_client(),
                NodeRole::Replica => {
                    cluster.replica_client(&format!("replica-{}", endpoint.port - 5433))
                }
            }
        }
    };
    let router = Router::from_config(&config, Arc::new(SystemClock), &connector)?;

    println!("== demo: {} routing ==", kind.as_str());

    for id in cluster.replica_ids() {
        cluster.hold_replica(id);
    }
    println!("replicas held: every new write lags on both replicas");

    let record = router.write("alice", "INSERT INTO replication_demo VALUES ('critical')")?;
    println!("alice wrote; primary log position {}", record.position);

    let outcome = router.read("alice", "SELECT * FROM replication_demo")?;
    println!(
        "immediate read served by {} ({} row(s) visible)",
        outcome.node_id,
        outcome.rows.len()
    );

    for lag in router.lag_report()? {
        match lag.lag_records {
            Some(records) => println!("  {} is {} record(s) behind", lag.replica_id, records),
            None => println!("  {} unreachable", lag.replica_id),
        }
    }

    for id in cluster.replica_ids() {
        cluster.release_replica(id);
    }
    println!("replicas released and caught up");

    if kind == PolicyKind::TimeWindow {
        println!("waiting out the {}s write window...", config.write_window_seconds);
        thread::sleep(config.write_window() + Duration::from_millis(100));
    }

    let outcome = router.read("alice", "SELECT * FROM replication_demo")?;
    println!(
        "read after catch-up served by {} ({} row(s) visible)",
        outcome.node_id,
        outcome.rows.len()
    );

    Ok(())
}

/// Run the policy comparison harness and print one line per policy.
pub fn bench(sessions: usize, writes: usize, reads: usize) -> CliResult<()> {
    let harness = BenchmarkHarness::new(BenchmarkOptions {
        sessions,
        writes_per_session: writes,
        reads_per_session: reads,
        ..BenchmarkOptions::default()
    });

    println!(
        "comparing policies: {sessions} session(s) x {writes} write(s) + {reads} read(s), 2 replicas (1 lagging)"
    );
    for report in harness.run()? {
        println!("{report}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy_accepts_known_kinds() {
        assert_eq!(parse_policy("time_window").unwrap(), PolicyKind::TimeWindow);
        assert_eq!(
            parse_policy("log_position").unwrap(),
            PolicyKind::LogPosition
        );
        assert_eq!(parse_policy("sticky_hash").unwrap(), PolicyKind::StickyHash);
    }

    #[test]
    fn test_parse_policy_rejects_unknown_kind() {
        let err = parse_policy("eventual").unwrap_err();
        assert_eq!(err.code(), CliErrorCode::ArgumentError);
    }
}
