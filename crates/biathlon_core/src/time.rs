//! Time-of-day and duration handling.
//!
//! Every timestamp in a race is a wall-clock time of day. They are anchored to
//! one fixed reference date so that only the time of day and the elapsed time
//! between two events carry meaning.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FormatError;

const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S%.3f";

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

/// A time of day with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn from_time(time: NaiveTime) -> Self {
        Self(reference_date().and_time(time))
    }

    /// Returns `None` when any component is out of range.
    pub fn from_hms_milli(hour: u32, minute: u32, second: u32, milli: u32) -> Option<Self> {
        if milli > 999 {
            return None;
        }
        NaiveTime::from_hms_milli_opt(hour, minute, second, milli).map(Self::from_time)
    }

    /// Signed elapsed time from `earlier` to `self`.
    pub fn since(&self, earlier: Timestamp) -> Duration {
        self.0 - earlier.0
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, delta: Duration) -> Timestamp {
        Timestamp(self.0 + delta)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIME_OF_DAY_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time_of_day(s)
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
        parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parses `HH:MM:SS` or `HH:MM:SS.mmm`.
pub fn parse_time_of_day(input: &str) -> Result<Timestamp, FormatError> {
    let invalid = || FormatError::InvalidTimeOfDay { input: input.to_string() };

    let (clock, milli) = match input.split_once('.') {
        Some((clock, fraction)) => (clock, fixed_width_number(fraction, 3).ok_or_else(invalid)?),
        None => (input, 0),
    };

    let mut fields = clock.split(':');
    let (Some(hour), Some(minute), Some(second), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(invalid());
    };

    let hour = fixed_width_number(hour, 2).ok_or_else(invalid)?;
    let minute = fixed_width_number(minute, 2).ok_or_else(invalid)?;
    let second = fixed_width_number(second, 2).ok_or_else(invalid)?;

    Timestamp::from_hms_milli(hour, minute, second, milli).ok_or_else(invalid)
}

fn fixed_width_number(field: &str, width: usize) -> Option<u32> {
    if field.len() != width || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Parses a strict `HH:MM:SS` duration. A fractional suffix on the seconds
/// field is accepted and dropped.
pub fn parse_duration(input: &str) -> Result<Duration, FormatError> {
    let invalid = |reason| FormatError::InvalidDuration { input: input.to_string(), reason };

    let fields: Vec<&str> = input.split(':').collect();
    let [hours, minutes, seconds] = fields.as_slice() else {
        return Err(invalid("expected HH:MM:SS"));
    };
    let seconds = seconds.split_once('.').map_or(*seconds, |(whole, _)| whole);

    let hours: i64 = hours.trim().parse().map_err(|_| invalid("invalid hours"))?;
    let minutes: i64 = minutes.trim().parse().map_err(|_| invalid("invalid minutes"))?;
    let seconds: i64 = seconds.trim().parse().map_err(|_| invalid("invalid seconds"))?;

    hours
        .checked_mul(3600)
        .and_then(|total| minutes.checked_mul(60).and_then(|m| total.checked_add(m)))
        .and_then(|total| total.checked_add(seconds))
        .and_then(Duration::try_seconds)
        .ok_or_else(|| invalid("out of range"))
}

/// Renders `HH:MM:SS.mmm`, using the absolute value and truncating to
/// milliseconds.
pub fn format_duration(duration: Duration) -> String {
    let duration = if duration < Duration::zero() { -duration } else { duration };
    let total_ms = duration.num_milliseconds();

    let hours = total_ms / 3_600_000;
    let minutes = total_ms % 3_600_000 / 60_000;
    let seconds = total_ms % 60_000 / 1000;
    let millis = total_ms % 1000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

pub fn format_time_of_day(timestamp: Timestamp) -> String {
    timestamp.to_string()
}

pub(crate) fn serialize_duration<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*duration))
}

pub(crate) fn serialize_optional_duration<S: Serializer>(
    duration: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match duration {
        Some(duration) => serializer.serialize_some(&format_duration(*duration)),
        None => serializer.serialize_none(),
    }
}
