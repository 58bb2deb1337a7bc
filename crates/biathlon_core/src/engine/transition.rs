//! Competitor state machine: one event in, one competitor mutated.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::RaceConfig;
use crate::models::{
    Competitor, CompetitorId, EventKind, Lap, LapProgress, RaceEvent, RaceState, ShootingSession,
    Status,
};
use crate::time::Timestamp;

/// An event that arrived while the competitor was in an unexpected status.
/// The transition still applies.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Anomaly {
    StartedAfterTerminal,
    TargetHitOffRange,
    LeftRangeWhileOffRange,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Warning {
    pub competitor: CompetitorId,
    pub status: Status,
    pub anomaly: Anomaly,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (id, status) = (self.competitor, self.status);
        match self.anomaly {
            Anomaly::StartedAfterTerminal => write!(
                f,
                "Warning: Competitor {} received Start event but is already {}.",
                id, status
            ),
            Anomaly::TargetHitOffRange => write!(
                f,
                "Warning: Competitor {} ({}) received TargetHit event but is not on firing range.",
                id, status
            ),
            Anomaly::LeftRangeWhileOffRange => write!(
                f,
                "Warning: Competitor {} ({}) received LeftFiringRange event but was not on firing range.",
                id, status
            ),
        }
    }
}

/// Side effects of applying one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    /// Events derived from the applied one, in emission order.
    pub follow_ups: Vec<RaceEvent>,
    pub warnings: Vec<Warning>,
}

impl Transition {
    fn warn(&mut self, competitor: &Competitor, anomaly: Anomaly) {
        let warning = Warning { competitor: competitor.id, status: competitor.status(), anomaly };
        warn!(competitor = competitor.id, status = %warning.status, ?anomaly, "out-of-state event");
        self.warnings.push(warning);
    }
}

impl Competitor {
    /// Applies `event` to this competitor.
    pub fn apply(&mut self, event: &RaceEvent, config: &RaceConfig) -> Transition {
        let mut outcome = Transition::default();
        let ts = event.timestamp;
        self.last_event = Some(ts);

        match &event.kind {
            EventKind::Registered => self.state = RaceState::Registered,
            EventKind::StartTimeAssigned { scheduled } => {
                self.scheduled_start = Some(*scheduled);
                self.state = RaceState::Scheduled;
            }
            EventKind::OnStartLine | EventKind::Finished | EventKind::Unrecognized { .. } => {}
            EventKind::Started => self.start(ts, &mut outcome),
            EventKind::OnFiringRange { range } => {
                let mut progress = self.take_progress();
                progress.range = Some(*range);
                progress.range_entry = Some(ts);
                progress.hits_in_session = 0;
                self.state = RaceState::OnFiringRange(progress);
            }
            EventKind::TargetHit { .. } => {
                if self.status() != Status::OnFiringRange {
                    outcome.warn(self, Anomaly::TargetHitOffRange);
                }
                if let Some(progress) = self.state.progress_mut() {
                    progress.hits_in_session += 1;
                }
                self.total_hits += 1;
            }
            EventKind::LeftFiringRange => self.leave_range(ts, &mut outcome),
            EventKind::EnteredPenaltyLoop => {
                let mut progress = self.take_progress();
                progress.penalty_entry = Some(ts);
                self.state = RaceState::InPenaltyLoop(progress);
            }
            EventKind::LeftPenaltyLoop => self.leave_penalty_loop(ts),
            EventKind::LapCompleted => self.complete_lap(ts, config, &mut outcome),
            EventKind::CannotContinue { comment } => {
                self.state = RaceState::NotFinished;
                self.dnf_comment = Some(comment.clone());
            }
            EventKind::Disqualified { reason } => {
                self.state = RaceState::Disqualified;
                self.disqualification_reason = reason.clone();
            }
        }

        outcome
    }

    /// Resolves competitors who never started and derives lap statistics.
    /// Safe to call repeatedly.
    pub fn finalize(&mut self, config: &RaceConfig) {
        if self.actual_start.is_none() {
            let status = self.status();
            let never_started = status.is_pre_race()
                || (self.scheduled_start.is_some()
                    && !matches!(status, Status::Disqualified | Status::NotFinished));
            if never_started && status != Status::NotStarted {
                debug!(competitor = self.id, from = %status, "marking competitor as not started");
                self.state = RaceState::NotStarted;
            }
        }

        for lap in &mut self.laps {
            lap.compute_stats(config.lap_len);
        }
    }

    fn take_progress(&mut self) -> LapProgress {
        std::mem::replace(&mut self.state, RaceState::Registered).into_progress()
    }

    fn current_lap_mut(&mut self) -> Option<&mut Lap> {
        let index = (self.current_lap as usize).checked_sub(1)?;
        self.laps.get_mut(index)
    }

    fn start(&mut self, ts: Timestamp, outcome: &mut Transition) {
        if matches!(self.status(), Status::NotStarted | Status::Disqualified) {
            outcome.warn(self, Anomaly::StartedAfterTerminal);
            return;
        }

        self.actual_start = Some(ts);
        self.current_lap = 1;
        let mut progress = self.take_progress();
        progress.lap_start = Some(ts);
        self.state = RaceState::Racing(progress);
        if self.laps.is_empty() {
            self.laps.push(Lap::open(1, ts));
        }
    }

    fn leave_range(&mut self, ts: Timestamp, outcome: &mut Transition) {
        if self.status() != Status::OnFiringRange {
            outcome.warn(self, Anomaly::LeftRangeWhileOffRange);
        }

        let mut progress = self.take_progress();
        let session = ShootingSession::close(
            progress.range.take(),
            progress.range_entry.take(),
            ts,
            progress.hits_in_session,
        );
        progress.penalties_owed = session.penalties_incurred;

        let shots = session.shots;
        match self.current_lap_mut() {
            Some(lap) => {
                lap.shooting.push(session);
                self.total_shots += shots;
            }
            None => warn!(competitor = self.id, "shooting session outside any lap dropped"),
        }

        self.state = RaceState::Racing(progress);
    }

    fn leave_penalty_loop(&mut self, ts: Timestamp) {
        let mut progress = self.take_progress();
        let served = std::mem::take(&mut progress.penalties_owed);
        let entry = progress.penalty_entry.take();

        if let Some(lap) = self.current_lap_mut() {
            lap.penalty_entry = entry;
            lap.penalty_exit = Some(ts);
            lap.penalties_served = served;
            self.total_penalties_served += served;
        }

        self.state = RaceState::Racing(progress);
    }

    fn complete_lap(&mut self, ts: Timestamp, config: &RaceConfig, outcome: &mut Transition) {
        if let Some(lap) = self.current_lap_mut() {
            lap.end = Some(ts);
        }

        if self.current_lap >= config.laps {
            self.state = RaceState::Completed;
            self.finish = Some(ts);
            outcome.follow_ups.push(RaceEvent::new(ts, self.id, EventKind::Finished));
            return;
        }

        self.current_lap += 1;
        let mut progress = self.take_progress();
        progress.lap_start = Some(ts);
        self.state = RaceState::Racing(progress);

        let number = self.current_lap;
        match self.laps.get_mut(number as usize - 1) {
            Some(lap) => lap.start = ts,
            None => self.laps.push(Lap::open(number, ts)),
        }
    }
}
