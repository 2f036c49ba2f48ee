//! # Temporal Types: UTC-Only Timestamps
//!
//! Defines `Timestamp`, the single instant type used for `createdAt`,
//! `publishedAt`, `lastSyncAt` and friends.
//!
//! ## Accepted Input Formats
//!
//! The backend is not consistent about how it renders instants, so parsing
//! is lenient and normalisation happens at the edge:
//!
//! | Input | Interpretation |
//! |-------|----------------|
//! | `2026-01-15T12:00:00Z`, `2026-01-15T17:00:00+05:00` | RFC 3339, converted to UTC |
//! | `2026-01-15T12:00:00`, `2026-01-15 12:00:00.250` | naive local date-time, taken as UTC |
//! | `1768478400000` (JSON integer) | Unix epoch milliseconds |
//!
//! Output is always RFC 3339 with millisecond precision and a `Z` suffix.
//! Sub-millisecond precision is discarded so that a value survives a
//! serialize/deserialize round trip unchanged.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A UTC-only timestamp, truncated to millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to milliseconds.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// Wrap a `DateTime<Utc>`, truncating sub-millisecond components.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_millis(dt))
    }

    /// Parse any of the accepted textual formats.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTimestamp`] when the input matches none
    /// of the accepted formats.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::from_utc(dt.with_timezone(&Utc)));
        }
        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Self::from_utc(naive.and_utc()));
            }
        }
        Err(CoreError::InvalidTimestamp {
            input: s.to_string(),
            reason: "expected RFC 3339, naive ISO 8601 date-time, or epoch milliseconds"
                .to_string(),
        })
    }

    /// Create a timestamp from Unix epoch milliseconds.
    pub fn from_epoch_millis(millis: i64) -> Result<Self, CoreError> {
        DateTime::from_timestamp_millis(millis)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidTimestamp {
                input: millis.to_string(),
                reason: "epoch milliseconds out of range".to_string(),
            })
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch milliseconds.
    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Render as RFC 3339 with millisecond precision and `Z` suffix.
    pub fn to_rfc3339(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(i64),
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Text(s) => Timestamp::parse(&s),
            RawTimestamp::Millis(ms) => Timestamp::from_epoch_millis(ms),
        }
        .map_err(serde::de::Error::custom)
    }
}

fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    let millis = dt.nanosecond() / 1_000_000 * 1_000_000;
    dt.with_nanosecond(millis).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_submillisecond_component() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond() % 1_000_000, 0);
    }

    #[test]
    fn rfc3339_with_offset_converted_to_utc() {
        let ts = Timestamp::parse("2026-01-15T17:00:00+05:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-15T12:00:00.000Z");
    }

    #[test]
    fn naive_iso_taken_as_utc() {
        let ts = Timestamp::parse("2026-01-15T12:00:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-15T12:00:00.000Z");
    }

    #[test]
    fn naive_space_separated_with_fraction() {
        let ts = Timestamp::parse("2026-01-15 12:00:00.250").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-15T12:00:00.250Z");
    }

    #[test]
    fn garbage_rejected() {
        assert!(Timestamp::parse("not-a-date").is_err());
        assert!(Timestamp::parse("2026-01-15").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    #[test]
    fn deserializes_from_epoch_millis() {
        let ts: Timestamp = serde_json::from_str("1768478400000").unwrap();
        let expected = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(*ts.as_datetime(), expected);
    }

    #[test]
    fn deserializes_from_naive_string() {
        let ts: Timestamp = serde_json::from_str(r#""2026-01-15 12:00:00""#).unwrap();
        assert_eq!(ts.epoch_millis(), 1_768_478_400_000);
    }

    #[test]
    fn serde_roundtrip_is_stable() {
        let ts = Timestamp::parse("2026-01-15T12:00:00.123456Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, r#""2026-01-15T12:00:00.123Z""#);
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn ordering_follows_instant() {
        let earlier = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let later = Timestamp::parse("2026-01-15T12:00:00.001Z").unwrap();
        assert!(earlier < later);
    }
}
