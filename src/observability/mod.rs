//! Observability
//!
//! Structured logging for routing decisions. Every log line is one event,
//! emitted synchronously as a single JSON object with deterministic key
//! ordering.

mod logger;

pub use logger::{Logger, Severity};

use crate::oracle::ReplicaLag;
use crate::position::LogPosition;

/// A read was routed.
pub fn route_decision(policy: &str, session: &str, node_id: &str, rows: usize) {
    Logger::info(
        "route_decision",
        &[
            ("node", node_id),
            ("policy", policy),
            ("rows", &rows.to_string()),
            ("session", session),
        ],
    );
}

/// A write committed on the primary.
pub fn write_committed(session: &str, node_id: &str, position: LogPosition) {
    Logger::info(
        "write_committed",
        &[
            ("node", node_id),
            ("position", &position.to_string()),
            ("session", session),
        ],
    );
}

/// A node did not answer within its timeout.
pub fn node_unreachable(node_id: &str) {
    Logger::warn("node_unreachable", &[("node", node_id)]);
}

/// One replica's observed lag.
pub fn replica_lag(lag: &ReplicaLag) {
    let replayed = lag
        .replayed
        .map(|p| p.to_string())
        .unwrap_or_else(|| "unreachable".to_string());
    let records = lag
        .lag_records
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    Logger::info(
        "replica_lag",
        &[
            ("current", &lag.current.to_string()),
            ("lag_records", &records),
            ("replayed", &replayed),
            ("replica", &lag.replica_id),
        ],
    );
}
