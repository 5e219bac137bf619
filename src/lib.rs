//! lagroute - consistency-aware read/write routing for primary-replica stores
//!
//! One writable primary, N read-only replicas trailing it by a variable
//! number of replicated log records. Every read carries a consistency
//! expectation; this crate decides which node can honor it:
//!
//! - time-window routing keeps a session on the primary briefly after its
//!   writes,
//! - log-position routing proves a replica has replayed the session's last
//!   write before letting it serve,
//! - sticky-hash routing pins a session to one replica for monotonic reads.

pub mod bench;
pub mod cli;
pub mod clock;
pub mod config;
pub mod errors;
pub mod node;
pub mod observability;
pub mod oracle;
pub mod policy;
pub mod position;
pub mod router;
pub mod session;
pub mod store;
