pub mod competitor;
pub mod event;
pub mod lap;

pub use competitor::{Competitor, LapProgress, LapResult, PenaltySummary, RaceState, Status};
pub use event::{CompetitorId, EventKind, RaceEvent};
pub use lap::{Lap, ShootingSession, SHOTS_PER_SESSION};
