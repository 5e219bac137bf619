//! Consistency Policies
//!
//! Three interchangeable strategies decide which node serves a read:
//!
//! - Time-windowed primary affinity: primary for a fixed window after a
//!   session's write, replicas afterwards. Cheap; no extra queries.
//! - Log-position gating: a replica serves only if it proves it has
//!   replayed the session's last write. Exact; one extra round trip.
//! - Sticky hash affinity: each session is hashed onto one fixed replica
//!   for life. Monotonic reads; no freshness promise.
//!
//! Writes always go to the primary regardless of the active policy; a
//! policy only chooses the read target. Policies route, they never retry:
//! execution failures after selection belong to the caller.

mod log_position;
mod sticky;
mod time_window;

pub use log_position::LogPositionPolicy;
pub use sticky::{stable_hash, StickyHashPolicy};
pub use time_window::TimeWindowPolicy;

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::{PolicyKind, RouterConfig};
use crate::errors::RouterResult;
use crate::node::{Node, NodeRegistry};
use crate::oracle::StalenessOracle;
use crate::session::SessionState;

/// Read-routing capability shared by the three strategies.
pub trait ConsistencyPolicy: Send + Sync {
    /// Policy name for error context and log lines.
    fn name(&self) -> &'static str;

    /// Choose the node that serves this session's next read.
    ///
    /// Called with the session's state locked by the router; a policy may
    /// consult and (for sticky binding) mutate it, but session bookkeeping
    /// for writes stays with the router.
    fn select_node_for_read(
        &self,
        session_key: &str,
        session: &mut SessionState,
        registry: &NodeRegistry,
        oracle: &StalenessOracle,
    ) -> RouterResult<Arc<Node>>;
}

/// Build the configured strategy.
pub fn build_policy(config: &RouterConfig, clock: Arc<dyn Clock>) -> Box<dyn ConsistencyPolicy> {
    match config.consistency_policy {
        PolicyKind::TimeWindow => Box::new(TimeWindowPolicy::new(config.write_window(), clock)),
        PolicyKind::LogPosition => Box::new(LogPositionPolicy::new()),
        PolicyKind::StickyHash => Box::new(StickyHashPolicy::new()),
    }
}
