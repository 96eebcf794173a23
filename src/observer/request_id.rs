//! Request identifier generation
//!
//! `UnixNanos` formats the call's start time as nanoseconds since the Unix
//! epoch. Two calls starting in the same nanosecond (or on a coarse clock)
//! get the same id. `Uuid` avoids that at the cost of losing the embedded
//! start time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestIdStrategy {
    #[default]
    UnixNanos,
    Uuid,
}

impl RequestIdStrategy {
    /// Identifier for a call that started at `start`
    pub fn generate(&self, start: DateTime<Utc>) -> String {
        match self {
            Self::UnixNanos => unix_nanos_id(start),
            Self::Uuid => Uuid::new_v4().to_string(),
        }
    }
}

/// Decimal nanoseconds since the Unix epoch
///
/// Falls back to microsecond precision scaled up for instants outside the
/// range an `i64` of nanoseconds can hold (roughly 1677..2262).
pub fn unix_nanos_id(start: DateTime<Utc>) -> String {
    match start.timestamp_nanos_opt() {
        Some(nanos) => nanos.to_string(),
        None => (i128::from(start.timestamp_micros()) * 1_000).to_string(),
    }
}
