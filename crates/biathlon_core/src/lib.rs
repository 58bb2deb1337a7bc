//! # biathlon_core - Deterministic Biathlon Race Replay
//!
//! Replays a timestamped event log from a biathlon race against a race
//! configuration, narrating every event and producing a final results table.
//!
//! ## Features
//! - Same config and event log always give the same narration and standings
//! - Per-competitor state machine with lap, shooting and penalty bookkeeping
//! - Malformed event lines are skipped and reported, never fatal
//! - Text and JSON result rendering

pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod models;
pub mod report;
pub mod time;

pub use config::{RaceConfig, RawConfig};
pub use decode::{decode_events, decode_line, load_events, Decoded, SkippedLine};
pub use engine::{Anomaly, Simulation, Transition, Warning};
pub use error::{ConfigError, DecodeError, FormatError, RaceError, Result};
pub use models::{Competitor, CompetitorId, EventKind, Lap, RaceEvent, ShootingSession, Status};
pub use report::{render_log, render_text, ResultRow, Standings};
pub use time::{format_duration, format_time_of_day, parse_duration, parse_time_of_day, Timestamp};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
