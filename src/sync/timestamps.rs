//! Freshness comparisons.
//!
//! Drives report modification times with millisecond precision, so all
//! comparisons happen at that resolution. Equal instants are never "newer".

use chrono::{DateTime, Utc};

/// `a` is strictly later than `b` (at millisecond resolution).
pub fn is_newer_than(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.timestamp_millis() > b.timestamp_millis()
}
