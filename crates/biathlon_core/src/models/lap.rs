use chrono::Duration;
use serde::Serialize;

use crate::time::{serialize_optional_duration, Timestamp};

/// Shots fired in every shooting bout.
pub const SHOTS_PER_SESSION: u32 = 5;

/// One visit to a firing range. Immutable once recorded.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShootingSession {
    pub range: Option<u32>,
    pub entry: Option<Timestamp>,
    pub exit: Timestamp,
    pub hits: u32,
    pub shots: u32,
    pub penalties_incurred: u32,
}

impl ShootingSession {
    /// Closes a bout of [`SHOTS_PER_SESSION`] shots. Hits beyond the bout size
    /// are clamped so penalties never go negative.
    pub fn close(range: Option<u32>, entry: Option<Timestamp>, exit: Timestamp, hits: u32) -> Self {
        let shots = SHOTS_PER_SESSION;
        let hits = hits.min(shots);
        Self { range, entry, exit, hits, shots, penalties_incurred: shots - hits }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Lap {
    /// 1-based.
    pub number: u32,
    pub start: Timestamp,
    pub end: Option<Timestamp>,
    pub shooting: Vec<ShootingSession>,
    pub penalty_entry: Option<Timestamp>,
    pub penalty_exit: Option<Timestamp>,
    pub penalties_served: u32,

    // Derived during finalization.
    #[serde(serialize_with = "serialize_optional_duration")]
    pub duration: Option<Duration>,
    pub average_speed: f64,
}

impl Lap {
    pub fn open(number: u32, start: Timestamp) -> Self {
        Self {
            number,
            start,
            end: None,
            shooting: Vec::new(),
            penalty_entry: None,
            penalty_exit: None,
            penalties_served: 0,
            duration: None,
            average_speed: 0.0,
        }
    }

    /// Recomputes duration and speed from the recorded timestamps.
    pub fn compute_stats(&mut self, lap_len: u32) {
        self.duration = self.end.map(|end| end.since(self.start));
        self.average_speed = match self.duration {
            Some(duration) if duration > Duration::zero() => {
                lap_len as f64 / seconds(duration)
            }
            _ => 0.0,
        };
    }

    /// Time spent in the penalty loop, if both ends were observed.
    pub fn penalty_time(&self) -> Option<Duration> {
        match (self.penalty_entry, self.penalty_exit) {
            (Some(entry), Some(exit)) => Some(exit.since(entry)),
            _ => None,
        }
    }
}

pub(crate) fn seconds(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}
