//! Replication Log Positions
//!
//! A `LogPosition` marks a point in the primary's replicated change log.
//!
//! Invariants:
//! - Positions are produced only by querying a node (`current_position` on
//!   the primary, `replayed_position` on a replica); the router never
//!   fabricates one.
//! - Positions from one log are totally ordered; a replica's replayed marker
//!   originates from the same log as the primary's current marker, so the
//!   two are directly comparable.
//! - Immutable once created.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in the replication log.
///
/// Encoded as a (segment, offset) pair compared lexicographically, matching
/// how write-ahead logs address their records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogPosition {
    /// Log segment number
    pub segment: u64,
    /// Record offset within the segment
    pub offset: u64,
}

impl LogPosition {
    /// Create a position from a segment and offset.
    pub fn new(segment: u64, offset: u64) -> Self {
        Self { segment, offset }
    }

    /// Start of the log.
    pub fn genesis() -> Self {
        Self {
            segment: 0,
            offset: 0,
        }
    }

    /// Position after appending `records` further records to this segment.
    pub fn advance(&self, records: u64) -> Self {
        Self {
            segment: self.segment,
            offset: self.offset + records,
        }
    }

    /// Three-way comparison against another position from the same log.
    pub fn compare(&self, other: &LogPosition) -> Ordering {
        self.cmp(other)
    }

    /// Records between `self` and an earlier position, when both sit in the
    /// same segment. Cross-segment gaps have no record-count interpretation.
    pub fn records_since(&self, earlier: &LogPosition) -> Option<u64> {
        if self.segment == earlier.segment && self.offset >= earlier.offset {
            Some(self.offset - earlier.offset)
        } else {
            None
        }
    }
}

impl fmt::Display for LogPosition {
    /// Rendered `segment/offset` in hex, the conventional log-position form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}/{:X}", self.segment, self.offset)
    }
}
