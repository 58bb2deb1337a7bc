use std::fmt;

use chrono::Duration;
use serde::Serialize;

use super::event::CompetitorId;
use super::lap::{seconds, Lap};
use crate::config::RaceConfig;
use crate::time::{format_duration, serialize_duration, Timestamp};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Status {
    Registered,
    Scheduled,
    Racing,
    OnFiringRange,
    InPenaltyLoop,
    Completed,
    NotStarted,
    NotFinished,
    Disqualified,
}

impl Status {
    pub fn is_pre_race(self) -> bool {
        matches!(self, Status::Registered | Status::Scheduled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Registered => "Registered",
            Status::Scheduled => "Scheduled",
            Status::Racing => "Racing",
            Status::OnFiringRange => "OnFiringRange",
            Status::InPenaltyLoop => "InPenaltyLoop",
            Status::Completed => "Completed",
            Status::NotStarted => "NotStarted",
            Status::NotFinished => "NotFinished",
            Status::Disqualified => "Disqualified",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work in progress on the current lap that has not yet been committed to a
/// [`Lap`] or shooting session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LapProgress {
    pub lap_start: Option<Timestamp>,
    pub range: Option<u32>,
    pub range_entry: Option<Timestamp>,
    pub hits_in_session: u32,
    /// Misses from the last shooting session still to be run off.
    pub penalties_owed: u32,
    pub penalty_entry: Option<Timestamp>,
}

/// Competitor state. Lap progress only exists while on course.
#[derive(Debug, Clone, PartialEq)]
pub enum RaceState {
    Registered,
    Scheduled,
    Racing(LapProgress),
    OnFiringRange(LapProgress),
    InPenaltyLoop(LapProgress),
    Completed,
    NotStarted,
    NotFinished,
    Disqualified,
}

impl RaceState {
    pub fn status(&self) -> Status {
        match self {
            RaceState::Registered => Status::Registered,
            RaceState::Scheduled => Status::Scheduled,
            RaceState::Racing(_) => Status::Racing,
            RaceState::OnFiringRange(_) => Status::OnFiringRange,
            RaceState::InPenaltyLoop(_) => Status::InPenaltyLoop,
            RaceState::Completed => Status::Completed,
            RaceState::NotStarted => Status::NotStarted,
            RaceState::NotFinished => Status::NotFinished,
            RaceState::Disqualified => Status::Disqualified,
        }
    }

    pub fn progress(&self) -> Option<&LapProgress> {
        match self {
            RaceState::Racing(p) | RaceState::OnFiringRange(p) | RaceState::InPenaltyLoop(p) => {
                Some(p)
            }
            _ => None,
        }
    }

    pub(crate) fn progress_mut(&mut self) -> Option<&mut LapProgress> {
        match self {
            RaceState::Racing(p) | RaceState::OnFiringRange(p) | RaceState::InPenaltyLoop(p) => {
                Some(p)
            }
            _ => None,
        }
    }

    /// Consumes the state, keeping its progress or starting a fresh one.
    pub(crate) fn into_progress(self) -> LapProgress {
        match self {
            RaceState::Racing(p) | RaceState::OnFiringRange(p) | RaceState::InPenaltyLoop(p) => p,
            _ => LapProgress::default(),
        }
    }
}

/// Per-competitor race record.
#[derive(Debug, Clone, PartialEq)]
pub struct Competitor {
    pub id: CompetitorId,
    pub(crate) state: RaceState,
    pub scheduled_start: Option<Timestamp>,
    pub actual_start: Option<Timestamp>,
    pub finish: Option<Timestamp>,
    pub last_event: Option<Timestamp>,
    pub current_lap: u32,
    pub laps: Vec<Lap>,
    pub total_hits: u32,
    pub total_shots: u32,
    pub total_penalties_served: u32,
    pub dnf_comment: Option<String>,
    pub disqualification_reason: Option<String>,
}

/// Duration and speed of one closed lap.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct LapResult {
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    pub speed: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct PenaltySummary {
    #[serde(serialize_with = "serialize_duration")]
    pub total_time: Duration,
    pub loops: u32,
    pub average_speed: f64,
}

impl Competitor {
    pub fn new(id: CompetitorId) -> Self {
        Self {
            id,
            state: RaceState::Registered,
            scheduled_start: None,
            actual_start: None,
            finish: None,
            last_event: None,
            current_lap: 0,
            laps: Vec::new(),
            total_hits: 0,
            total_shots: 0,
            total_penalties_served: 0,
            dnf_comment: None,
            disqualification_reason: None,
        }
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn state(&self) -> &RaceState {
        &self.state
    }

    pub fn shooting_sessions(&self) -> usize {
        self.laps.iter().map(|lap| lap.shooting.len()).sum()
    }

    /// Finish minus actual start, for completed competitors only.
    pub fn race_time(&self) -> Option<Duration> {
        if self.status() != Status::Completed {
            return None;
        }
        match (self.actual_start, self.finish) {
            (Some(start), Some(finish)) => Some(finish.since(start)),
            _ => None,
        }
    }

    /// Overall race time, or the bracketed status when there is none.
    pub fn result_label(&self) -> String {
        match self.race_time() {
            Some(time) => format_duration(time),
            None => format!("[{}]", self.status()),
        }
    }

    /// One entry per configured lap; `None` where the lap was never closed.
    pub fn lap_results(&self, config: &RaceConfig) -> Vec<Option<LapResult>> {
        (0..config.laps as usize)
            .map(|i| {
                let lap = self.laps.get(i)?;
                lap.duration.map(|duration| LapResult { duration, speed: lap.average_speed })
            })
            .collect()
    }

    pub fn penalty_summary(&self, config: &RaceConfig) -> PenaltySummary {
        // Loops only count where the loop time is known.
        let (total_time, loops) = self
            .laps
            .iter()
            .filter_map(|lap| lap.penalty_time().map(|time| (time, lap.penalties_served)))
            .fold((Duration::zero(), 0u32), |(time, loops), (t, n)| (time + t, loops + n));

        let average_speed = if total_time > Duration::zero() && loops > 0 && config.penalty_len > 0 {
            (loops as f64 * config.penalty_len as f64) / seconds(total_time)
        } else {
            0.0
        };

        PenaltySummary { total_time, loops, average_speed }
    }

    /// `hits/shots`.
    pub fn shooting_summary(&self) -> String {
        format!("{}/{}", self.total_hits, self.total_shots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> Timestamp {
        Timestamp::from_hms_milli(h, m, s, 0).unwrap()
    }

    fn config(laps: u32) -> RaceConfig {
        RaceConfig::new(laps, 3000, 150, 2, at(10, 0, 0), Duration::seconds(30))
    }

    #[test]
    fn test_new_competitor_is_registered() {
        let c = Competitor::new(4);
        assert_eq!(c.status(), Status::Registered);
        assert!(c.state().progress().is_none());
        assert_eq!(c.result_label(), "[Registered]");
        assert_eq!(c.shooting_summary(), "0/0");
    }

    #[test]
    fn test_race_time_only_when_completed() {
        let mut c = Competitor::new(1);
        c.actual_start = Some(at(10, 0, 0));
        c.finish = Some(at(10, 30, 0));
        assert_eq!(c.race_time(), None);

        c.state = RaceState::Completed;
        assert_eq!(c.race_time(), Some(Duration::minutes(30)));
        assert_eq!(c.result_label(), "00:30:00.000");
    }

    #[test]
    fn test_lap_results_padded_to_config() {
        let mut c = Competitor::new(1);
        let mut lap = Lap::open(1, at(10, 0, 0));
        lap.end = Some(at(10, 10, 0));
        lap.compute_stats(3000);
        c.laps.push(lap);
        c.laps.push(Lap::open(2, at(10, 10, 0)));

        let results = c.lap_results(&config(3));
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Some(LapResult { duration: Duration::minutes(10), speed: 5.0 }));
        assert_eq!(results[1], None);
        assert_eq!(results[2], None);
    }

    #[test]
    fn test_penalty_summary_aggregates_laps() {
        let mut c = Competitor::new(1);
        let mut first = Lap::open(1, at(10, 0, 0));
        first.penalty_entry = Some(at(10, 5, 0));
        first.penalty_exit = Some(at(10, 6, 0));
        first.penalties_served = 2;
        let mut second = Lap::open(2, at(10, 10, 0));
        second.penalty_entry = Some(at(10, 15, 0));
        second.penalty_exit = Some(at(10, 15, 30));
        second.penalties_served = 1;
        c.laps = vec![first, second];

        let summary = c.penalty_summary(&config(2));
        assert_eq!(summary.total_time, Duration::seconds(90));
        assert_eq!(summary.loops, 3);
        assert!((summary.average_speed - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_summary_without_loops_is_zero() {
        let c = Competitor::new(1);
        let summary = c.penalty_summary(&config(2));
        assert_eq!(summary.total_time, Duration::zero());
        assert_eq!(summary.loops, 0);
        assert_eq!(summary.average_speed, 0.0);
    }
}
