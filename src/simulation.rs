use crate::bracket::{resolve_tournament, ResolvedTournament};
use crate::config::{load_json_or_default, save_json};
use crate::predictions::{PredictionBook, PredictionInput, SubmitReport};
use crate::tournament::Tournament;
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};
use tracing::info;

pub type SimulationState = ResolvedTournament;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedScore {
  pub home: Option<u32>,
  pub away: Option<u32>,
}

impl SimulatedScore {
  pub fn new(home: u32, away: u32) -> Self {
    SimulatedScore {
      home: Some(home),
      away: Some(away),
    }
  }

  pub fn both(&self) -> Option<(u32, u32)> {
    Some((self.home?, self.away?))
  }
}

/// A user's hypothetical scores, keyed by match id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Simulation {
  scores: BTreeMap<String, SimulatedScore>,
}

impl Simulation {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn load(path: &Path) -> Result<Self, String> {
    load_json_or_default(path, "simulation")
  }

  pub fn save(&self, path: &Path) -> Result<(), String> {
    save_json(path, "simulation", self)
  }

  pub fn get(&self, match_id: &str) -> Option<SimulatedScore> {
    self.scores.get(match_id).copied()
  }

  pub fn len(&self) -> usize {
    self.scores.len()
  }

  pub fn is_empty(&self) -> bool {
    self.scores.is_empty()
  }

  pub fn set_score(&mut self, match_id: &str, home: Option<u32>, away: Option<u32>) {
    self.scores.insert(match_id.to_string(), SimulatedScore { home, away });
  }

  pub fn clear_score(&mut self, match_id: &str) -> bool {
    self.scores.remove(match_id).is_some()
  }

  /// Overlay the simulated scores; a match with both values becomes finished.
  pub fn apply(&self, matches: &[Match]) -> Vec<Match> {
    matches
      .iter()
      .map(|m| {
        let Some(sim) = self.scores.get(&m.id) else {
          return m.clone();
        };
        let mut out = m.clone();
        out.home_score = sim.home;
        out.away_score = sim.away;
        if sim.both().is_some() {
          out.status = MatchStatus::Finished;
        }
        out
      })
      .collect()
  }

  pub fn project(&self, tournament: &Tournament) -> SimulationState {
    resolve_tournament(tournament, &self.apply(&tournament.matches))
  }

  pub fn sync_real(&mut self, matches: &[Match]) -> usize {
    let mut count = 0;
    for m in matches.iter().filter(|m| m.status == MatchStatus::Finished) {
      if let Some((home, away)) = m.scores() {
        self.scores.insert(m.id.clone(), SimulatedScore::new(home, away));
        count += 1;
      }
    }
    info!(count, "synced real results into simulation");
    count
  }

  /// Submit the filled scores as predictions; locked matches come back rejected.
  pub fn export_to_league(
    &self,
    book: &mut PredictionBook,
    league: &League,
    user_id: &str,
    matches: &[Match],
    group: Option<&str>,
    now: DateTime<Utc>,
  ) -> SubmitReport {
    let inputs: Vec<PredictionInput> = self
      .scores
      .iter()
      .filter_map(|(match_id, sim)| {
        let (home, away) = sim.both()?;
        if let Some(group) = group {
          let scheduled = matches.iter().find(|m| &m.id == match_id)?;
          if scheduled.group.as_deref() != Some(group) {
            return None;
          }
        }
        Some(PredictionInput::new(match_id, i64::from(home), i64::from(away)))
      })
      .collect();
    book.submit_many(league, user_id, &inputs, matches, now)
  }

  pub fn import_from_league(&mut self, book: &PredictionBook, league_id: &str, user_id: &str) -> usize {
    let mut count = 0;
    for p in book.for_user_in_league(user_id, league_id) {
      self
        .scores
        .insert(p.match_id.clone(), SimulatedScore::new(p.home_score, p.away_score));
      count += 1;
    }
    info!(league_id, user_id, count, "imported league predictions into simulation");
    count
  }
}
