//! Router Configuration
//!
//! Configured externally (JSON file or built in code), validated before
//! any node is contacted, immutable after startup.
//!
//! Recognized options:
//! - `primary_endpoint`: address of the single writable node (required)
//! - `replica_endpoints`: ordered replica addresses; the order is the
//!   stable order sticky hashing and fallback scans use
//! - `write_window_seconds`: freshness window for time-window routing
//!   (default 5, must be >= 0)
//! - `consistency_policy`: `time_window` | `log_position` | `sticky_hash`
//! - `stale_connection_timeout_millis`: per-call node timeout
//!   (default 2000, must be > 0)
//!
//! No credentials live here; connection establishment is the collaborator's
//! concern.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{RouterError, RouterResult};
use crate::node::Endpoint;

/// Which consistency strategy the router runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    TimeWindow,
    LogPosition,
    StickyHash,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeWindow => "time_window",
            Self::LogPosition => "log_position",
            Self::StickyHash => "sticky_hash",
        }
    }
}

/// Router configuration surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// The single writable node
    pub primary_endpoint: Endpoint,

    /// Read-only replicas, in routing order (may be empty for time-window
    /// and log-position routing; sticky hashing needs at least one)
    #[serde(default)]
    pub replica_endpoints: Vec<Endpoint>,

    /// Seconds a session's reads stay on the primary after a write
    /// (time-window routing). Signed so an invalid negative value parses
    /// and is rejected by `validate` instead of failing opaquely in serde.
    #[serde(default = "default_write_window_seconds")]
    pub write_window_seconds: i64,

    /// Active consistency strategy
    #[serde(default)]
    pub consistency_policy: PolicyKind,

    /// Per-call node timeout in milliseconds
    #[serde(default = "default_stale_connection_timeout_millis")]
    pub stale_connection_timeout_millis: u64,
}

fn default_write_window_seconds() -> i64 {
    5
}

fn default_stale_connection_timeout_millis() -> u64 {
    2000
}

impl RouterConfig {
    /// Minimal configuration over a primary endpoint, defaults elsewhere.
    pub fn new(primary_endpoint: Endpoint) -> Self {
        Self {
            primary_endpoint,
            replica_endpoints: Vec::new(),
            write_window_seconds: default_write_window_seconds(),
            consistency_policy: PolicyKind::default(),
            stale_connection_timeout_millis: default_stale_connection_timeout_millis(),
        }
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> RouterResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            RouterError::configuration(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            RouterError::configuration(format!("cannot parse config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate topology and policy parameters.
    ///
    /// Runs before any node is contacted; a failure here is fatal.
    pub fn validate(&self) -> RouterResult<()> {
        if self.primary_endpoint.host.is_empty() {
            return Err(RouterError::configuration(
                "primary_endpoint host must not be empty",
            ));
        }
        if self.write_window_seconds < 0 {
            return Err(RouterError::configuration(format!(
                "write_window_seconds must be >= 0, got {}",
                self.write_window_seconds
            )));
        }
        if self.stale_connection_timeout_millis == 0 {
            return Err(RouterError::configuration(
                "stale_connection_timeout_millis must be > 0",
            ));
        }
        if self.consistency_policy == PolicyKind::StickyHash && self.replica_endpoints.is_empty()
        {
            return Err(RouterError::configuration(
                "sticky_hash routing requires at least one replica endpoint",
            ));
        }
        Ok(())
    }

    /// Freshness window as a duration. Valid only after `validate`.
    pub fn write_window(&self) -> Duration {
        Duration::from_secs(self.write_window_seconds.max(0) as u64)
    }

    /// Per-call node timeout as a duration.
    pub fn node_timeout(&self) -> Duration {
        Duration::from_millis(self.stale_connection_timeout_millis)
    }
}
