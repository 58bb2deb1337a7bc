//! Event log decoding.
//!
//! Each line reads `[HH:MM:SS.mmm] <eventId> <competitorId> [extra params]`.
//! Lines that do not decode are skipped and reported, never fatal.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{DecodeError, Result};
use crate::models::{CompetitorId, EventKind, RaceEvent};
use crate::time::{parse_time_of_day, Timestamp};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based.
    pub line_number: usize,
    pub line: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    pub events: Vec<RaceEvent>,
    pub skipped: Vec<SkippedLine>,
}

pub fn load_events(path: impl AsRef<Path>) -> Result<Decoded> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|source| DecodeError::Io { path: path.to_path_buf(), source })?;
    let decoded = decode_events(&text);
    log::info!(
        "Loaded {} events from {} ({} lines skipped)",
        decoded.events.len(),
        path.display(),
        decoded.skipped.len()
    );
    Ok(decoded)
}

pub fn decode_events(text: &str) -> Decoded {
    let mut decoded = Decoded::default();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match decode_line(line) {
            Ok(event) => decoded.events.push(event),
            Err(reason) => {
                log::warn!("Skipping malformed event line {}: {} ({})", index + 1, line, reason);
                decoded.skipped.push(SkippedLine {
                    line_number: index + 1,
                    line: line.to_string(),
                    reason,
                });
            }
        }
    }

    decoded
}

/// Decodes one trimmed, non-empty line.
pub fn decode_line(line: &str) -> std::result::Result<RaceEvent, String> {
    let rest = line.strip_prefix('[').ok_or("missing '[' before timestamp")?;
    let (stamp, rest) = rest.split_once(']').ok_or("missing ']' after timestamp")?;
    let timestamp = parse_time_of_day(stamp).map_err(|e| e.to_string())?;

    let (code, rest) = next_token(rest);
    let (competitor, params) = next_token(rest);
    let code: u32 = parse_number(code, "event id")?;
    let competitor: CompetitorId = parse_number(competitor, "competitor id")?;
    let params = params.trim();

    let kind = decode_kind(code, params)?;
    Ok(RaceEvent::new(timestamp, competitor, kind))
}

fn next_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => text.split_at(end),
        None => (text, ""),
    }
}

fn parse_number(field: &str, what: &str) -> std::result::Result<u32, String> {
    if field.is_empty() {
        return Err(format!("missing {}", what));
    }
    field.parse().map_err(|_| format!("invalid {} '{}'", what, field))
}

fn decode_kind(code: u32, params: &str) -> std::result::Result<EventKind, String> {
    let kind = match code {
        1 => EventKind::Registered,
        2 => EventKind::StartTimeAssigned { scheduled: parse_scheduled(params)? },
        3 => EventKind::OnStartLine,
        4 => EventKind::Started,
        5 => EventKind::OnFiringRange { range: parse_number(params, "firing range")? },
        6 => EventKind::TargetHit { target: parse_number(params, "target")? },
        7 => EventKind::LeftFiringRange,
        8 => EventKind::EnteredPenaltyLoop,
        9 => EventKind::LeftPenaltyLoop,
        10 => EventKind::LapCompleted,
        11 => EventKind::CannotContinue { comment: params.to_string() },
        32 => EventKind::Disqualified {
            reason: (!params.is_empty()).then(|| params.to_string()),
        },
        33 => EventKind::Finished,
        other => EventKind::Unrecognized { code: other, params: params.to_string() },
    };
    Ok(kind)
}

fn parse_scheduled(params: &str) -> std::result::Result<Timestamp, String> {
    parse_time_of_day(params).map_err(|e| format!("invalid scheduled start: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn at(h: u32, m: u32, s: u32, ms: u32) -> Timestamp {
        Timestamp::from_hms_milli(h, m, s, ms).unwrap()
    }

    #[test]
    fn test_decode_every_kind() {
        let text = "\
[09:05:59.867] 1 1
[09:15:00.841] 2 1 09:30:00.000
[09:29:45.734] 3 1
[09:30:01.005] 4 1
[09:49:31.659] 5 1 1
[09:49:33.123] 6 1 1
[09:49:38.339] 7 1
[09:49:55.915] 8 1
[09:51:48.391] 9 1
[09:59:03.872] 10 1
[09:59:05.321] 11 1 Lost in the forest
[09:59:06.000] 32 2 false start
[09:59:07.000] 32 3
[09:59:08.000] 33 1
";
        let decoded = decode_events(text);
        assert!(decoded.skipped.is_empty(), "{:?}", decoded.skipped);
        let kinds: Vec<EventKind> = decoded.events.iter().map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Registered,
                EventKind::StartTimeAssigned { scheduled: at(9, 30, 0, 0) },
                EventKind::OnStartLine,
                EventKind::Started,
                EventKind::OnFiringRange { range: 1 },
                EventKind::TargetHit { target: 1 },
                EventKind::LeftFiringRange,
                EventKind::EnteredPenaltyLoop,
                EventKind::LeftPenaltyLoop,
                EventKind::LapCompleted,
                EventKind::CannotContinue { comment: "Lost in the forest".into() },
                EventKind::Disqualified { reason: Some("false start".into()) },
                EventKind::Disqualified { reason: None },
                EventKind::Finished,
            ]
        );
        assert_eq!(decoded.events[0].timestamp, at(9, 5, 59, 867));
        assert_eq!(decoded.events[11].competitor, 2);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let text = "\
[09:05:59.867] 1 1
not an event
[25:00:00.000] 1 2
[09:10:00.000] x 3
[09:10:00.000] 2 4 tomorrow
[09:10:00.000] 5 5

[09:11:00.000] 6 6 two
[09:12:00.000] 4
";
        let decoded = decode_events(text);
        assert_eq!(decoded.events.len(), 1);
        let lines: Vec<usize> = decoded.skipped.iter().map(|s| s.line_number).collect();
        assert_eq!(lines, vec![2, 3, 4, 5, 6, 8, 9]);
        assert_eq!(decoded.skipped[2].reason, "invalid event id 'x'");
        assert_eq!(decoded.skipped[6].reason, "missing competitor id");
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        let event = decode_line("[10:00:00.000] 42 7 something odd").unwrap();
        assert_eq!(event.kind, EventKind::Unrecognized { code: 42, params: "something odd".into() });
        assert_eq!(event.competitor, 7);
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let decoded = decode_events("   [10:00:00.000]   4   12   \n");
        assert_eq!(decoded.events, vec![RaceEvent::new(at(10, 0, 0, 0), 12, EventKind::Started)]);
    }

    #[test]
    fn test_load_events_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[09:00:00.000] 1 1").unwrap();
        writeln!(file, "[09:00:01.000] 1 2").unwrap();
        let decoded = load_events(file.path()).unwrap();
        assert_eq!(decoded.events.len(), 2);
    }

    #[test]
    fn test_load_events_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_events(dir.path().join("events")).is_err());
    }
}
