//! Configuration Surface Invariants
//!
//! Configuration problems are fatal and must surface before any node is
//! contacted.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lagroute::clock::SystemClock;
use lagroute::config::{PolicyKind, RouterConfig};
use lagroute::errors::RouterError;
use lagroute::node::{Endpoint, NodeRole};
use lagroute::router::Router;
use lagroute::store::{MemoryCluster, NodeClient};

/// A negative write window is rejected before the connector runs once.
#[test]
fn test_negative_window_fails_before_any_node_contact() {
    let connects = Arc::new(AtomicUsize::new(0));
    let cluster = MemoryCluster::new(1);
    let connector = {
        let connects = Arc::clone(&connects);
        let cluster = cluster.clone();
        move |_: &Endpoint, role: NodeRole| -> Arc<dyn NodeClient> {
            connects.fetch_add(1, Ordering::SeqCst);
            match role {
                NodeRole::Primary => cluster.primary_client(),
                NodeRole::Replica => cluster.replica_client("replica-0"),
            }
        }
    };

    let mut config = RouterConfig::new(Endpoint::new("localhost", 5432));
    config.replica_endpoints = vec![Endpoint::new("localhost", 5433)];
    config.write_window_seconds = -1;

    let result = Router::from_config(&config, Arc::new(SystemClock), &connector);
    match result {
        Err(RouterError::Configuration { message }) => {
            assert!(message.contains("write_window_seconds"));
        }
        other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
    }
    assert_eq!(connects.load(Ordering::SeqCst), 0);
}

#[test]
fn test_valid_config_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lagroute.json");
    fs::write(
        &path,
        r#"{
            "primary_endpoint": { "host": "db-primary", "port": 5432 },
            "replica_endpoints": [{ "host": "db-replica", "port": 5433 }],
            "consistency_policy": "log_position"
        }"#,
    )
    .unwrap();

    let config = RouterConfig::load(&path).unwrap();
    assert_eq!(config.consistency_policy, PolicyKind::LogPosition);
    assert_eq!(config.primary_endpoint, Endpoint::new("db-primary", 5432));
    assert_eq!(config.write_window_seconds, 5);
}

#[test]
fn test_invalid_file_values_fail_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lagroute.json");
    fs::write(
        &path,
        r#"{
            "primary_endpoint": { "host": "db-primary", "port": 5432 },
            "write_window_seconds": -1
        }"#,
    )
    .unwrap();

    assert!(matches!(
        RouterConfig::load(&path),
        Err(RouterError::Configuration { .. })
    ));
}

#[test]
fn test_unknown_policy_name_fails_to_parse() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lagroute.json");
    fs::write(
        &path,
        r#"{
            "primary_endpoint": { "host": "db", "port": 5432 },
            "consistency_policy": "eventual"
        }"#,
    )
    .unwrap();

    assert!(matches!(
        RouterConfig::load(&path),
        Err(RouterError::Configuration { .. })
    ));
}

#[test]
fn test_missing_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    assert!(matches!(
        RouterConfig::load(&path),
        Err(RouterError::Configuration { .. })
    ));
}

#[test]
fn test_sticky_hash_without_replicas_is_rejected() {
    let mut config = RouterConfig::new(Endpoint::new("localhost", 5432));
    config.consistency_policy = PolicyKind::StickyHash;
    assert!(matches!(
        config.validate(),
        Err(RouterError::Configuration { .. })
    ));
}
