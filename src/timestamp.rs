use std::fmt;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

/// Wire and storage format shared by every timestamp.
pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

// `d` marks an ASCII digit, everything else must match literally.
const SHAPE: &[u8; 27] = b"dddd-dd-ddTdd:dd:dd.ddddddZ";

#[derive(Debug, Error)]
#[error("`{0}` is not a YYYY-MM-DDTHH:MM:SS.ffffffZ timestamp")]
pub struct InvalidTimestamp(String);

/// A UTC instant with microsecond precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(6))
    }

    /// Parses the fixed `YYYY-MM-DDTHH:MM:SS.ffffffZ` form and nothing else.
    pub fn parse(value: &str) -> Result<Self, InvalidTimestamp> {
        if !has_fixed_shape(value) {
            return Err(InvalidTimestamp(value.to_owned()));
        }

        let naive = NaiveDateTime::parse_from_str(value, PARSE_FORMAT)
            .map_err(|_| InvalidTimestamp(value.to_owned()))?;

        // chrono reads second 60 as a leap second at any minute.
        if naive.nanosecond() >= 1_000_000_000 {
            return Err(InvalidTimestamp(value.to_owned()));
        }

        Ok(Self(naive.and_utc()))
    }

    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

fn has_fixed_shape(value: &str) -> bool {
    value.len() == SHAPE.len()
        && value.bytes().zip(SHAPE.iter()).all(|(byte, &expected)| {
            if expected == b'd' {
                byte.is_ascii_digit()
            } else {
                byte == expected
            }
        })
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.trunc_subsecs(6))
    }
}

impl TryFrom<String> for Timestamp {
    type Error = InvalidTimestamp;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}
