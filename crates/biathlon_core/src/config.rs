//! Race configuration.
//!
//! The on-disk shape is a small JSON document whose time fields are text.
//! Loading resolves those fields up front, so a malformed value aborts the
//! run before any competitor exists.

use std::fs;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::time::{parse_duration, parse_time_of_day, serialize_duration, Timestamp};

/// Config file as written by race organizers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    pub laps: u32,
    pub lap_len: u32,
    pub penalty_len: u32,
    pub firing_lines: u32,
    pub start: String,
    pub start_delta: String,
}

/// Resolved, immutable race configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceConfig {
    pub laps: u32,
    /// Main lap length in metres.
    pub lap_len: u32,
    /// Penalty loop length in metres.
    pub penalty_len: u32,
    pub firing_lines: u32,
    /// Scheduled start of the first competitor.
    pub start: Timestamp,
    /// Interval between consecutive scheduled starts.
    #[serde(serialize_with = "serialize_duration")]
    pub start_delta: Duration,
}

impl RaceConfig {
    pub fn new(
        laps: u32,
        lap_len: u32,
        penalty_len: u32,
        firing_lines: u32,
        start: Timestamp,
        start_delta: Duration,
    ) -> Self {
        Self { laps, lap_len, penalty_len, firing_lines, start, start_delta }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config = Self::from_json_str(&text)?;
        log::info!(
            "Loaded race config from {}: {} laps of {}m, penalty loop {}m",
            path.display(),
            config.laps,
            config.lap_len,
            config.penalty_len
        );
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(text).map_err(ConfigError::from)?;
        Ok(Self::try_from(raw)?)
    }
}

impl TryFrom<RawConfig> for RaceConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        let start = parse_time_of_day(&raw.start)
            .map_err(|source| ConfigError::Format { field: "start", source })?;
        let start_delta = parse_duration(&raw.start_delta)
            .map_err(|source| ConfigError::Format { field: "startDelta", source })?;

        for (field, value) in [
            ("laps", raw.laps),
            ("lapLen", raw.lap_len),
            ("firingLines", raw.firing_lines),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive { field });
            }
        }

        Ok(Self::new(raw.laps, raw.lap_len, raw.penalty_len, raw.firing_lines, start, start_delta))
    }
}
