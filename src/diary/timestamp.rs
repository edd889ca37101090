//! Normalization of the timestamp shapes found in feed payloads.
//!
//! Feeds hand over timestamps as server timestamp objects, epoch milliseconds,
//! RFC 3339 strings, naive date-times or bare dates. They are all turned into a
//! `DateTime<Utc>` here, before an entry reaches the store; nothing deeper in
//! the pipeline looks at the raw shape again.

use crate::grouper::DisplayZone;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("timestamp out of range: {0}")]
    OutOfRange(String),

    #[error("unrecognized timestamp: {0}")]
    Unrecognized(String),

    #[error("time {0} does not exist in the display zone")]
    NonexistentLocalTime(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Server {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    Millis(i64),
    Instant(DateTime<Utc>),
    Text(String),
}

impl RawTimestamp {
    pub fn normalize(&self, zone: &DisplayZone) -> Result<DateTime<Utc>, TimestampError> {
        match self {
            RawTimestamp::Server {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(*seconds, *nanoseconds)
                .ok_or_else(|| TimestampError::OutOfRange(format!("{}s", seconds))),
            RawTimestamp::Millis(millis) => DateTime::from_timestamp_millis(*millis)
                .ok_or_else(|| TimestampError::OutOfRange(format!("{}ms", millis))),
            RawTimestamp::Instant(instant) => Ok(*instant),
            RawTimestamp::Text(text) => parse_text(text.trim(), zone),
        }
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        RawTimestamp::Instant(instant)
    }
}

fn parse_text(text: &str, zone: &DisplayZone) -> Result<DateTime<Utc>, TimestampError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| TimestampError::Unrecognized(text.to_string()))?;

    zone.localize(&naive)
        .ok_or_else(|| TimestampError::NonexistentLocalTime(text.to_string()))
}

/// Reads a user supplied time, e.g. from the command line.
pub fn parse_user_time(text: &str, zone: &DisplayZone) -> Result<DateTime<Utc>, TimestampError> {
    RawTimestamp::Text(text.to_string()).normalize(zone)
}
