//! Final standings and their text / JSON rendering.

use chrono::Duration;
use serde::Serialize;

use crate::engine::Simulation;
use crate::models::{CompetitorId, LapResult, PenaltySummary, Status};
use crate::time::{format_duration, serialize_optional_duration};

/// One line of the results table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResultRow {
    /// Race time, or `[Status]` for competitors without one.
    pub result: String,
    pub competitor: CompetitorId,
    pub status: Status,
    #[serde(serialize_with = "serialize_optional_duration")]
    pub race_time: Option<Duration>,
    /// One slot per configured lap.
    pub laps: Vec<Option<LapResult>>,
    pub penalty: PenaltySummary,
    /// `hits/shots`.
    pub shooting: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Standings {
    pub rows: Vec<ResultRow>,
}

impl Standings {
    /// Ranks finishers by race time, then everyone else by status group.
    /// Ties break on competitor id.
    pub fn build(simulation: &Simulation) -> Self {
        let config = simulation.config();
        let mut rows: Vec<ResultRow> = simulation
            .competitors()
            .values()
            .map(|c| ResultRow {
                result: c.result_label(),
                competitor: c.id,
                status: c.status(),
                race_time: c.race_time(),
                laps: c.lap_results(config),
                penalty: c.penalty_summary(config),
                shooting: c.shooting_summary(),
            })
            .collect();

        rows.sort_by_key(|row| (rank_group(row), row.race_time, row.competitor));
        Self { rows }
    }

    pub fn render_table(&self) -> String {
        let mut out = String::from("Resulting table\n---------------\n");
        out.push_str(&table_line(
            "Result/Status",
            "ID",
            "Lap Details (Time, Speed m/s)",
            "Penalty (Time, Speed m/s)",
            "Shooting",
        ));
        for row in &self.rows {
            out.push_str(&table_line(
                &row.result,
                &row.competitor.to_string(),
                &lap_cells(&row.laps),
                &penalty_cell(&row.penalty),
                &row.shooting,
            ));
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn rank_group(row: &ResultRow) -> u8 {
    if row.race_time.is_some() {
        return 0;
    }
    match row.status {
        Status::NotFinished => 1,
        Status::NotStarted => 2,
        Status::Disqualified => 3,
        _ => 4,
    }
}

fn table_line(result: &str, id: &str, laps: &str, penalty: &str, shooting: &str) -> String {
    let line = format!("{:<15} {:<5} {:<45} {:<23} {}", result, id, laps, penalty, shooting);
    format!("{}\n", line.trim_end())
}

fn lap_cells(laps: &[Option<LapResult>]) -> String {
    let cells: Vec<String> = laps
        .iter()
        .map(|lap| match lap {
            Some(lap) => format!("{{{}, {:.3}}}", format_duration(lap.duration), lap.speed),
            None => "{,}".to_string(),
        })
        .collect();
    format!("[{}]", cells.join(", "))
}

fn penalty_cell(penalty: &PenaltySummary) -> String {
    format!("{{{}, {:.3}}}", format_duration(penalty.total_time), penalty.average_speed)
}

/// "Output log" section: every narration line in processing order.
pub fn render_log(lines: &[String]) -> String {
    let mut out = String::from("Output log\n----------\n");
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Narration log followed by the results table.
pub fn render_text(simulation: &Simulation) -> String {
    format!("{}\n{}", render_log(simulation.log()), Standings::build(simulation).render_table())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RaceConfig;
    use crate::models::{EventKind, RaceEvent};
    use crate::time::Timestamp;

    fn at(h: u32, m: u32, s: u32) -> Timestamp {
        Timestamp::from_hms_milli(h, m, s, 0).unwrap()
    }

    fn event(ts: Timestamp, id: CompetitorId, kind: EventKind) -> RaceEvent {
        RaceEvent::new(ts, id, kind)
    }

    fn finished_race() -> Simulation {
        let config = RaceConfig::new(2, 3500, 150, 1, at(10, 0, 0), Duration::minutes(1));
        let mut events = vec![
            event(at(10, 20, 30), 1, EventKind::LapCompleted),
            event(at(10, 10, 0), 1, EventKind::LapCompleted),
            event(at(10, 5, 40), 1, EventKind::LeftPenaltyLoop),
            event(at(10, 5, 10), 1, EventKind::EnteredPenaltyLoop),
            event(at(10, 5, 5), 1, EventKind::LeftFiringRange),
            event(at(10, 4, 0), 2, EventKind::CannotContinue { comment: "Broken ski".into() }),
            event(at(10, 1, 0), 2, EventKind::Started),
            event(at(10, 0, 0), 1, EventKind::Started),
            event(at(9, 30, 0), 4, EventKind::Disqualified { reason: None }),
        ];
        for target in 1..=4 {
            events.push(event(at(10, 5, target), 1, EventKind::TargetHit { target }));
        }
        events.push(event(at(10, 5, 0), 1, EventKind::OnFiringRange { range: 1 }));
        for (offset, id) in [1u32, 2, 3, 4].into_iter().enumerate() {
            events.push(event(at(9, 0, offset as u32), id, EventKind::Registered));
        }
        for (offset, id) in [1u32, 2, 3].into_iter().enumerate() {
            let scheduled = at(10, offset as u32, 0);
            events.push(event(at(9, 10, offset as u32), id, EventKind::StartTimeAssigned { scheduled }));
        }

        let mut simulation = Simulation::new(config);
        simulation.run(events);
        simulation
    }

    #[test]
    fn test_standings_order() {
        let standings = Standings::build(&finished_race());
        let order: Vec<(CompetitorId, Status)> =
            standings.rows.iter().map(|row| (row.competitor, row.status)).collect();
        assert_eq!(
            order,
            vec![
                (1, Status::Completed),
                (2, Status::NotFinished),
                (3, Status::NotStarted),
                (4, Status::Disqualified),
            ]
        );
    }

    #[test]
    fn test_finishers_ranked_by_race_time() {
        let config = RaceConfig::new(1, 1000, 100, 1, at(10, 0, 0), Duration::minutes(1));
        let mut simulation = Simulation::new(config);
        simulation.run(vec![
            event(at(10, 0, 0), 7, EventKind::Started),
            event(at(10, 1, 0), 3, EventKind::Started),
            event(at(10, 9, 0), 7, EventKind::LapCompleted),
            event(at(10, 9, 30), 3, EventKind::LapCompleted),
        ]);

        let standings = Standings::build(&simulation);
        let ids: Vec<CompetitorId> = standings.rows.iter().map(|row| row.competitor).collect();
        assert_eq!(ids, vec![3, 7]);
        assert_eq!(standings.rows[0].result, "00:08:30.000");
    }

    #[test]
    fn test_render_table() {
        let table = Standings::build(&finished_race()).render_table();
        insta::assert_snapshot!(table.trim_end(), @r###"
        Resulting table
        ---------------
        Result/Status   ID    Lap Details (Time, Speed m/s)                 Penalty (Time, Speed m/s) Shooting
        00:20:30.000    1     [{00:10:00.000, 5.833}, {00:10:30.000, 5.556}] {00:00:30.000, 5.000}   4/5
        [NotFinished]   2     [{,}, {,}]                                    {00:00:00.000, 0.000}   0/0
        [NotStarted]    3     [{,}, {,}]                                    {00:00:00.000, 0.000}   0/0
        [Disqualified]  4     [{,}, {,}]                                    {00:00:00.000, 0.000}   0/0
        "###);
    }

    #[test]
    fn test_json_rows() {
        let json = Standings::build(&finished_race()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let first = &value["rows"][0];
        assert_eq!(first["competitor"], 1);
        assert_eq!(first["status"], "Completed");
        assert_eq!(first["race_time"], "00:20:30.000");
        assert_eq!(first["laps"][0]["duration"], "00:10:00.000");
        assert_eq!(first["penalty"]["loops"], 1);
        assert_eq!(first["shooting"], "4/5");

        let second = &value["rows"][1];
        assert_eq!(second["result"], "[NotFinished]");
        assert!(second["race_time"].is_null());
        assert!(second["laps"][0].is_null());
    }

    #[test]
    fn test_render_text_has_both_sections() {
        let simulation = finished_race();
        let text = render_text(&simulation);
        assert!(text.starts_with("Output log\n----------\n[09:00:00.000] The competitor(1) registered\n"));
        assert!(text.contains("[10:20:30.000] The competitor(1) has finished\n"));
        assert!(text.contains("\n\nResulting table\n"));
    }
}
