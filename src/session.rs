//! Session State Tracking
//!
//! Each logical caller (session key) carries the three facts the
//! consistency policies consume: when it last wrote, the log position that
//! write produced, and which replica it is stuck to.
//!
//! Invariants:
//! - Only a session's own writes mutate its state; sessions never observe
//!   one another.
//! - `(last_write_at, last_write_position)` advance as a pair and never
//!   regress: write completion order wins, enforced by the monotonic guard
//!   in `record_write` under the per-session lock.
//! - A sticky binding, once made, never changes for the session's lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::position::LogPosition;

/// Per-session routing state.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    last_write_at: Option<Instant>,
    last_write_position: Option<LogPosition>,
    sticky_replica_id: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instant of the session's most recent write, if any.
    pub fn last_write_at(&self) -> Option<Instant> {
        self.last_write_at
    }

    /// Log position produced by the session's most recent write, if any.
    pub fn last_write_position(&self) -> Option<LogPosition> {
        self.last_write_position
    }

    /// Replica this session is bound to under sticky routing, if bound.
    pub fn sticky_replica_id(&self) -> Option<&str> {
        self.sticky_replica_id.as_deref()
    }

    /// Record a completed write.
    ///
    /// Timestamp and position are applied together, and only when the
    /// position advances past the stored one; a slower concurrent write
    /// that completed earlier cannot clobber a later write's state.
    pub fn record_write(&mut self, at: Instant, position: LogPosition) {
        match self.last_write_position {
            Some(current) if position <= current => {}
            _ => {
                self.last_write_at = Some(at);
                self.last_write_position = Some(position);
            }
        }
    }

    /// Bind the session to a replica. Write-once: a second bind is ignored
    /// and the original binding is returned.
    pub fn bind_sticky_replica(&mut self, replica_id: &str) -> &str {
        if self.sticky_replica_id.is_none() {
            self.sticky_replica_id = Some(replica_id.to_string());
        }
        self.sticky_replica_id
            .as_deref()
            .expect("sticky replica id was just set")
    }
}

/// Lock-guarded session map, keyed by session identifier.
///
/// The outer map lock is held only to resolve or create an entry; all state
/// mutation happens under the per-session lock, so concurrent operations on
/// different sessions never contend on each other's state.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a session's state handle, creating it lazily on first use.
    pub fn entry(&self, session_key: &str) -> Arc<Mutex<SessionState>> {
        let mut sessions = self.sessions.lock().unwrap();
        Arc::clone(
            sessions
                .entry(session_key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(SessionState::new()))),
        )
    }

    /// Resolve a session's state handle without creating one.
    pub fn get(&self, session_key: &str) -> Option<Arc<Mutex<SessionState>>> {
        self.sessions.lock().unwrap().get(session_key).map(Arc::clone)
    }

    /// Number of sessions seen so far.
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().unwrap().is_empty()
    }
}
