//! # Temporal Types
//!
//! UTC-only timestamp type. All timestamps are stored in UTC with
//! second-level precision and a `Z` suffix in serialized form.
//!
//! Sub-second precision is dropped at construction, not at formatting time.
//! A timestamp read back from storage therefore compares equal to the one
//! that was hashed into a document binding.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MuniError;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const CERTIFICATE_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// A UTC timestamp with second-level precision.
///
/// Serializes to ISO 8601 with `Z` suffix (e.g. `2026-01-15T12:00:00Z`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncated to seconds.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.trunc_subsecs(0))
    }

    /// Access the underlying `chrono::DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Parse an RFC 3339 / ISO 8601 string. Offsets are normalized to UTC.
    pub fn parse(s: &str) -> Result<Self, MuniError> {
        DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| Self::from_datetime(dt.with_timezone(&Utc)))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(s.trim(), ISO_FORMAT)
                    .map(|naive| Self::from_datetime(naive.and_utc()))
            })
            .map_err(|e| MuniError::Timestamp(format!("{s:?}: {e}")))
    }

    /// ISO 8601 with `Z` suffix, seconds precision. This is the form bound
    /// into document hashes.
    pub fn to_iso8601(&self) -> String {
        self.0.format(ISO_FORMAT).to_string()
    }

    /// Human-readable `dd-MM-yyyy HH:mm:ss` form printed on certificates.
    pub fn certificate_format(&self) -> String {
        self.0.format(CERTIFICATE_FORMAT).to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
