//! # Timestamp Value Object
//!
//! UTC instant used for request lifecycles, invitation rounds, webhook
//! receipts and broker messages.
//!
//! # Examples
//!
//! ```
//! use matching_service::domain::value_objects::timestamp::Timestamp;
//!
//! let round_started = Timestamp::from_secs(1_000).unwrap();
//! let invited = round_started.add_secs(30);
//!
//! assert!(invited.is_after(&round_started));
//! assert_eq!(invited.seconds_since(&round_started), 30);
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC timestamp.
///
/// Serializes as an RFC 3339 string, which is what the Matching broker
/// and the other marketplace modules exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from Unix milliseconds.
    ///
    /// Returns `None` if the value is out of range.
    #[must_use]
    pub fn from_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self)
    }

    /// Creates a timestamp from Unix seconds.
    ///
    /// Returns `None` if the value is out of range.
    #[must_use]
    pub fn from_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Returns the Unix timestamp in milliseconds.
    #[inline]
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Adds seconds to the timestamp (negative values move backwards).
    #[must_use]
    pub fn add_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// Returns true if this timestamp is before another.
    #[inline]
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.0 < other.0
    }

    /// Returns true if this timestamp is after another.
    #[inline]
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self.0 > other.0
    }

    /// Whole seconds elapsed from `earlier` to `self`, saturating at zero.
    #[must_use]
    pub fn seconds_since(&self, earlier: &Self) -> i64 {
        (self.0 - earlier.0).num_seconds().max(0)
    }

    /// Formats the timestamp as RFC 3339.
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Returns the underlying DateTime.
    #[inline]
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_millis_round_trips_value() {
        let ts = Timestamp::from_millis(1_704_067_200_000).unwrap();
        assert_eq!(ts.timestamp_millis(), 1_704_067_200_000);
    }

    #[test]
    fn seconds_since_saturates() {
        let a = Timestamp::from_secs(1_000).unwrap();
        let b = a.add_secs(90);
        assert_eq!(b.seconds_since(&a), 90);
        assert_eq!(a.seconds_since(&b), 0);
    }

    #[test]
    fn ordering_helpers() {
        let a = Timestamp::from_secs(1_000).unwrap();
        let b = Timestamp::from_secs(2_000).unwrap();
        assert!(a.is_before(&b));
        assert!(b.is_after(&a));
        assert!(a < b);
    }

    #[test]
    fn serializes_as_rfc3339() {
        let ts = Timestamp::from_secs(1_704_067_200).unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("2024-01-01T00:00:00"));
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }
}
