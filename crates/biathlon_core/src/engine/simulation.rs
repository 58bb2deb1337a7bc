//! Timeline replay.
//!
//! Events are stably sorted by timestamp and fed one at a time to the
//! competitor they address. Every consumed event produces a narration line;
//! warnings and derived events are narrated right after it.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::transition::Warning;
use crate::config::RaceConfig;
use crate::models::{Competitor, CompetitorId, EventKind, RaceEvent};

pub struct Simulation {
    config: RaceConfig,
    competitors: BTreeMap<CompetitorId, Competitor>,
    log: Vec<String>,
    warnings: Vec<Warning>,
}

impl Simulation {
    pub fn new(config: RaceConfig) -> Self {
        Self { config, competitors: BTreeMap::new(), log: Vec::new(), warnings: Vec::new() }
    }

    /// Replays `events` in timestamp order, then finalizes.
    ///
    /// Events sharing a timestamp keep their input order.
    pub fn run(&mut self, mut events: Vec<RaceEvent>) {
        info!(events = events.len(), "replaying race events");
        events.sort_by_key(|event| event.timestamp);

        for event in &events {
            self.process(event);
        }

        self.finalize();
        info!(
            competitors = self.competitors.len(),
            warnings = self.warnings.len(),
            "replay finished"
        );
    }

    /// Narrates one event and applies it to its competitor.
    pub fn process(&mut self, event: &RaceEvent) {
        self.log.push(event.narrate());

        if let EventKind::Unrecognized { code, .. } = &event.kind {
            warn!(code, competitor = event.competitor, "skipping unrecognized event");
            return;
        }

        let competitor = Self::upsert(&mut self.competitors, event.competitor);
        let outcome = competitor.apply(event, &self.config);

        for warning in outcome.warnings {
            self.log.push(warning.to_string());
            self.warnings.push(warning);
        }
        for follow_up in &outcome.follow_ups {
            debug!(competitor = follow_up.competitor, kind = follow_up.kind.name(), "derived event");
            self.log.push(follow_up.narrate());
        }
    }

    /// Closes out competitors who never started and derives lap statistics.
    /// Calling it again changes nothing.
    pub fn finalize(&mut self) {
        for competitor in self.competitors.values_mut() {
            competitor.finalize(&self.config);
        }
    }

    fn upsert(
        competitors: &mut BTreeMap<CompetitorId, Competitor>,
        id: CompetitorId,
    ) -> &mut Competitor {
        competitors.entry(id).or_insert_with(|| Competitor::new(id))
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn competitors(&self) -> &BTreeMap<CompetitorId, Competitor> {
        &self.competitors
    }

    pub fn competitor(&self, id: CompetitorId) -> Option<&Competitor> {
        self.competitors.get(&id)
    }

    /// Narration lines in processing order.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}
