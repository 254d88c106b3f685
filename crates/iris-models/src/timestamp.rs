//! Recording timestamps.
//!
//! A [`Timestamp`] is an offset from the start of a recording, stored as
//! whole milliseconds so that ordering and equality are exact.
//!
//! Accepted text formats:
//! - `HH:MM:SS` or `HH:MM:SS.mmm`
//! - `MM:SS` or `MM:SS.mmm`
//! - `SS` or `SS.mmm`
//!
//! Timestamps display (and serialize) as `HH:MM:SS`, or `HH:MM:SS.mmm`
//! when a sub-second part is present.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Offset into a recording with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    millis: u64,
}

impl Timestamp {
    /// The start of the recording.
    pub const ZERO: Timestamp = Timestamp { millis: 0 };

    /// Create a timestamp from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Create a timestamp from whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            millis: secs * 1000,
        }
    }

    /// Create a timestamp from fractional seconds, rounded to the nearest millisecond.
    pub fn from_secs_f64(secs: f64) -> Result<Self, TimestampError> {
        if !secs.is_finite() {
            return Err(TimestampError::InvalidValue("seconds", secs.to_string()));
        }
        if secs < 0.0 {
            return Err(TimestampError::Negative);
        }
        Ok(Self {
            millis: (secs * 1000.0).round() as u64,
        })
    }

    /// Milliseconds since the start of the recording.
    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    /// Seconds since the start of the recording.
    pub fn as_secs_f64(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    /// Parse a timestamp string.
    ///
    /// # Examples
    /// ```
    /// use iris_models::Timestamp;
    /// assert_eq!(Timestamp::parse("01:30:00").unwrap(), Timestamp::from_secs(5400));
    /// assert_eq!(Timestamp::parse("05:30").unwrap(), Timestamp::from_secs(330));
    /// assert_eq!(Timestamp::parse("90").unwrap(), Timestamp::from_secs(90));
    /// ```
    pub fn parse(ts: &str) -> Result<Self, TimestampError> {
        let ts = ts.trim();
        if ts.is_empty() {
            return Err(TimestampError::Empty);
        }

        let parts: Vec<&str> = ts.split(':').collect();
        let (hours, minutes, seconds) = match parts.as_slice() {
            [s] => ("0", "0", *s),
            [m, s] => ("0", *m, *s),
            [h, m, s] => (*h, *m, *s),
            _ => return Err(TimestampError::InvalidFormat(ts.to_string())),
        };

        let hours = parse_component("hours", hours)?;
        let minutes = parse_component("minutes", minutes)?;
        let seconds = parse_component("seconds", seconds)?;

        Self::from_secs_f64(hours * 3600.0 + minutes * 60.0 + seconds)
    }

    /// Text form usable inside a file name (`:` replaced by `-`).
    pub fn to_filename_safe(&self) -> String {
        self.to_string().replace(':', "-")
    }

    /// Seek argument for FFmpeg, always with millisecond precision.
    pub fn to_seek_arg(&self) -> String {
        let (hours, mins, secs, millis) = self.components();
        format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
    }

    fn components(&self) -> (u64, u64, u64, u64) {
        let total_secs = self.millis / 1000;
        (
            total_secs / 3600,
            (total_secs % 3600) / 60,
            total_secs % 60,
            self.millis % 1000,
        )
    }
}

fn parse_component(component: &'static str, raw: &str) -> Result<f64, TimestampError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| TimestampError::InvalidValue(component, raw.to_string()))?;
    if !value.is_finite() {
        return Err(TimestampError::InvalidValue(component, raw.to_string()));
    }
    if value < 0.0 {
        return Err(TimestampError::Negative);
    }
    Ok(value)
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, mins, secs, millis) = self.components();
        if millis == 0 {
            write!(f, "{:02}:{:02}:{:02}", hours, mins, secs)
        } else {
            write!(f, "{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
        }
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
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
        Timestamp::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,

    #[error("Timestamp cannot be negative")]
    Negative,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("Invalid timestamp format '{0}'. Use HH:MM:SS, HH:MM:SS.mmm, MM:SS, or SS")]
    InvalidFormat(String),
}
