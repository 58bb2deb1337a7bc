use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

pub type CompetitorId = u32;

/// One decoded occurrence in the race.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RaceEvent {
    pub timestamp: Timestamp,
    pub competitor: CompetitorId,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Registered,
    StartTimeAssigned { scheduled: Timestamp },
    OnStartLine,
    Started,
    OnFiringRange { range: u32 },
    TargetHit { target: u32 },
    LeftFiringRange,
    EnteredPenaltyLoop,
    LeftPenaltyLoop,
    LapCompleted,
    CannotContinue { comment: String },
    Disqualified {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Emitted by the engine when the last lap is completed.
    Finished,
    /// A numeric kind the decoder does not know. Narrated and otherwise ignored.
    Unrecognized { code: u32, params: String },
}

impl EventKind {
    /// Numeric identifier used in event logs.
    pub fn code(&self) -> u32 {
        match self {
            EventKind::Registered => 1,
            EventKind::StartTimeAssigned { .. } => 2,
            EventKind::OnStartLine => 3,
            EventKind::Started => 4,
            EventKind::OnFiringRange { .. } => 5,
            EventKind::TargetHit { .. } => 6,
            EventKind::LeftFiringRange => 7,
            EventKind::EnteredPenaltyLoop => 8,
            EventKind::LeftPenaltyLoop => 9,
            EventKind::LapCompleted => 10,
            EventKind::CannotContinue { .. } => 11,
            EventKind::Disqualified { .. } => 32,
            EventKind::Finished => 33,
            EventKind::Unrecognized { code, .. } => *code,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Registered => "Registered",
            EventKind::StartTimeAssigned { .. } => "StartTimeAssigned",
            EventKind::OnStartLine => "OnStartLine",
            EventKind::Started => "Started",
            EventKind::OnFiringRange { .. } => "OnFiringRange",
            EventKind::TargetHit { .. } => "TargetHit",
            EventKind::LeftFiringRange => "LeftFiringRange",
            EventKind::EnteredPenaltyLoop => "EnteredPenaltyLoop",
            EventKind::LeftPenaltyLoop => "LeftPenaltyLoop",
            EventKind::LapCompleted => "LapCompleted",
            EventKind::CannotContinue { .. } => "CannotContinue",
            EventKind::Disqualified { .. } => "Disqualified",
            EventKind::Finished => "Finished",
            EventKind::Unrecognized { .. } => "Unrecognized",
        }
    }
}

impl RaceEvent {
    pub fn new(timestamp: Timestamp, competitor: CompetitorId, kind: EventKind) -> Self {
        Self { timestamp, competitor, kind }
    }

    /// Human-readable description, without the timestamp prefix.
    pub fn describe(&self) -> String {
        let id = self.competitor;
        match &self.kind {
            EventKind::Registered => format!("The competitor({}) registered", id),
            EventKind::StartTimeAssigned { scheduled } => format!(
                "The start time for the competitor({}) was set by a draw to {}",
                id, scheduled
            ),
            EventKind::OnStartLine => format!("The competitor({}) is on the start line", id),
            EventKind::Started => format!("The competitor({}) has started", id),
            EventKind::OnFiringRange { range } => {
                format!("The competitor({}) is on the firing range({})", id, range)
            }
            EventKind::TargetHit { target } => {
                format!("The target({}) has been hit by competitor({})", target, id)
            }
            EventKind::LeftFiringRange => format!("The competitor({}) left the firing range", id),
            EventKind::EnteredPenaltyLoop => {
                format!("The competitor({}) entered the penalty laps", id)
            }
            EventKind::LeftPenaltyLoop => format!("The competitor({}) left the penalty laps", id),
            EventKind::LapCompleted => format!("The competitor({}) ended the main lap", id),
            EventKind::CannotContinue { comment } => {
                format!("The competitor({}) can't continue: {}", id, comment)
            }
            EventKind::Disqualified { .. } => format!("The competitor({}) is disqualified", id),
            EventKind::Finished => format!("The competitor({}) has finished", id),
            EventKind::Unrecognized { code, params } => format!(
                "Unknown event {} for competitor {} with params '{}'",
                code, id, params
            ),
        }
    }

    /// Narration line: `[HH:MM:SS.mmm] <description>`.
    pub fn narrate(&self) -> String {
        format!("[{}] {}", self.timestamp, self.describe())
    }
}

impl fmt::Display for RaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.narrate())
    }
}
