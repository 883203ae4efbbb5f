// In: src/time.rs

//! The instant type stored in `timestamp` columns.
//!
//! A `Timestamp` is an epoch second plus a sub-second nanosecond adjustment,
//! which is exactly what the page format persists. Text parsing and
//! rendering go through `chrono` and are confined to this module.

use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BulkrowError;

pub const NANOS_PER_SECOND: u32 = 1_000_000_000;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    epoch_second: i64,
    nano: u32,
}

impl Timestamp {
    /// Builds a timestamp; `nano` past one second carries into the seconds.
    pub fn new(epoch_second: i64, nano: u32) -> Self {
        let carry = i64::from(nano / NANOS_PER_SECOND);
        Self {
            epoch_second: epoch_second + carry,
            nano: nano % NANOS_PER_SECOND,
        }
    }

    pub fn from_epoch_second(epoch_second: i64) -> Self {
        Self {
            epoch_second,
            nano: 0,
        }
    }

    pub fn epoch_second(&self) -> i64 {
        self.epoch_second
    }

    pub fn nano(&self) -> u32 {
        self.nano
    }

    /// Parses RFC 3339 text (fractional seconds and offsets accepted).
    /// Malformed text is a parse failure, never a default value.
    pub fn parse(text: &str) -> Result<Self, BulkrowError> {
        let parsed = DateTime::parse_from_rfc3339(text).map_err(|e| {
            BulkrowError::TimestampParse {
                text: text.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            epoch_second: parsed.timestamp(),
            nano: parsed.timestamp_subsec_nanos(),
        })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Utc.timestamp_opt(self.epoch_second, self.nano).single() {
            Some(utc) => f.write_str(&utc.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => write!(f, "{}.{:09}s", self.epoch_second, self.nano),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_rfc3339_with_fraction_and_offset() {
        let ts = Timestamp::parse("2015-01-27T19:23:49.123456789Z").unwrap();
        assert_eq!(ts.epoch_second(), 1422386629);
        assert_eq!(ts.nano(), 123_456_789);

        let offset = Timestamp::parse("2015-01-27T19:23:49+09:00").unwrap();
        assert_eq!(offset.epoch_second(), 1422386629 - 9 * 3600);
    }

    #[test]
    fn test_malformed_text_is_a_parse_error() {
        assert!(matches!(
            Timestamp::parse("2015-01-27 19:23"),
            Err(BulkrowError::TimestampParse { .. })
        ));
    }

    #[test]
    fn test_nano_overflow_carries_into_seconds() {
        let ts = Timestamp::new(10, 2_500_000_000);
        assert_eq!(ts.epoch_second(), 12);
        assert_eq!(ts.nano(), 500_000_000);
    }
}
