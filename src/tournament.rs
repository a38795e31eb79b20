use crate::error::MatchError;
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path, thread::sleep, time::Duration};
use tracing::info;

const WORLD_CUP_2026: &str = include_str!("../data/world_cup_2026.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
  pub name: String,
  pub groups: BTreeMap<String, Vec<TeamId>>,
  #[serde(default)]
  pub third_place_slots: BTreeMap<String, Vec<String>>,
  pub matches: Vec<Match>,
}

impl Tournament {
  pub fn load_from(path: &Path) -> Result<Self, String> {
    let data = fs::read_to_string(path).map_err(|e| format!("read tournament {}: {e}", path.display()))?;
    Self::from_json(&data).map_err(|e| format!("parse tournament {}: {e}", path.display()))
  }

  pub fn from_json(data: &str) -> Result<Self, String> {
    let tournament = serde_json::from_str::<Tournament>(data).map_err(|e| e.to_string())?;
    tournament.validate()?;
    Ok(tournament)
  }

  pub fn world_cup_2026() -> Result<Self, String> {
    Self::from_json(WORLD_CUP_2026).map_err(|e| format!("embedded 2026 schedule: {e}"))
  }

  pub fn get_match(&self, match_id: &str) -> Option<&Match> {
    self.matches.iter().find(|m| m.id == match_id)
  }

  pub fn group_of(&self, team_id: &str) -> Option<&str> {
    self
      .groups
      .iter()
      .find(|(_, teams)| teams.iter().any(|t| t == team_id))
      .map(|(letter, _)| letter.as_str())
  }

  fn match_mut(&mut self, match_id: &str) -> Result<&mut Match, MatchError> {
    self
      .matches
      .iter_mut()
      .find(|m| m.id == match_id)
      .ok_or_else(|| MatchError::UnknownMatch {
        match_id: match_id.to_string(),
      })
  }

  // ── Admin edits ──

  pub fn record_result(&mut self, match_id: &str, home: u32, away: u32) -> Result<&Match, MatchError> {
    let m = self.match_mut(match_id)?;
    m.home_score = Some(home);
    m.away_score = Some(away);
    m.status = MatchStatus::Finished;
    info!(match_id, home, away, "result recorded");
    Ok(&*m)
  }

  pub fn update_match(&mut self, updated: Match) -> Result<(), MatchError> {
    let m = self.match_mut(&updated.id)?;
    info!(match_id = %updated.id, status = ?updated.status, "match updated");
    *m = updated;
    Ok(())
  }

  // Kickoff reached: live at 0 x 0.
  pub fn start_due_matches(&mut self, now: DateTime<Utc>) -> Vec<String> {
    let mut started = Vec::new();
    for m in self
      .matches
      .iter_mut()
      .filter(|m| m.status == MatchStatus::Scheduled && m.date <= now)
    {
      m.status = MatchStatus::InProgress;
      m.home_score = Some(0);
      m.away_score = Some(0);
      info!(match_id = %m.id, home = %m.home_team_id, away = %m.away_team_id, "match started");
      started.push(m.id.clone());
    }
    started
  }

  fn validate(&self) -> Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for m in &self.matches {
      if !seen.insert(m.id.as_str()) {
        return Err(format!("duplicate match id {}", m.id));
      }
      if m.phase == Phase::Group && m.group.is_none() {
        return Err(format!("group match {} has no group", m.id));
      }
    }
    for match_id in self.third_place_slots.keys() {
      if !seen.contains(match_id.as_str()) {
        return Err(format!("third-place slot {match_id} is not a scheduled match"));
      }
    }
    Ok(())
  }
}

pub fn spawn_kickoff_watcher(tournament: SharedTournament) {
  std::thread::spawn(move || loop {
    {
      let mut guard = tournament.lock().unwrap_or_else(|e| e.into_inner());
      guard.start_due_matches(Utc::now());
    }
    sleep(Duration::from_millis(KICKOFF_POLL_INTERVAL_MS));
  });
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bracket::resolve_tournament;
  use crate::leaderboard::{leaderboard, LeaderboardView};

  #[test]
  fn test_world_cup_2026_shape() {
    let t = Tournament::world_cup_2026().unwrap();
    assert_eq!(t.groups.len(), 12);
    assert!(t.groups.values().all(|teams| teams.len() == 4));
    assert_eq!(t.matches.len(), 104);
    assert_eq!(t.matches.iter().filter(|m| m.phase == Phase::Group).count(), 72);
    assert_eq!(t.matches.iter().filter(|m| m.phase == Phase::Round32).count(), 16);
    assert_eq!(t.matches.iter().filter(|m| m.phase == Phase::Final).count(), 2);
    assert_eq!(t.group_of("Brasil"), Some("C"));
  }

  #[test]
  fn test_third_place_table_is_exact() {
    let t = Tournament::world_cup_2026().unwrap();
    let expected: [(&str, &str); 8] = [
      ("m-R32-1", "ABCDF"),
      ("m-R32-2", "CDFGH"),
      ("m-R32-7", "BEFIJ"),
      ("m-R32-8", "AEHIJ"),
      ("m-R32-11", "CEFHI"),
      ("m-R32-12", "EHIJK"),
      ("m-R32-15", "EFGIJ"),
      ("m-R32-16", "DEIJL"),
    ];
    assert_eq!(t.third_place_slots.len(), expected.len());
    for (match_id, letters) in expected {
      let got: String = t.third_place_slots[match_id].concat();
      assert_eq!(got, letters, "{match_id}");
    }
  }

  #[test]
  fn test_group_matches_reference_configured_teams() {
    let t = Tournament::world_cup_2026().unwrap();
    for m in t.matches.iter().filter(|m| m.phase == Phase::Group) {
      let group = m.group.as_deref().unwrap();
      let teams = &t.groups[group];
      assert!(teams.contains(&m.home_team_id), "{}", m.id);
      assert!(teams.contains(&m.away_team_id), "{}", m.id);
    }
  }

  #[test]
  fn test_duplicate_match_id_rejected() {
    let data = r#"{
      "name": "x",
      "groups": {},
      "matches": [
        {"id":"m-1","homeTeamId":"a","awayTeamId":"b","homeScore":null,"awayScore":null,
         "date":"2026-06-11T19:00:00Z","phase":"FINAL","status":"SCHEDULED"},
        {"id":"m-1","homeTeamId":"a","awayTeamId":"b","homeScore":null,"awayScore":null,
         "date":"2026-06-11T19:00:00Z","phase":"Final","status":"SCHEDULED"}
      ]
    }"#;
    let err = Tournament::from_json(data).unwrap_err();
    assert!(err.contains("duplicate match id m-1"));
  }

  #[test]
  fn test_record_result_finishes_match() {
    let mut t = Tournament::world_cup_2026().unwrap();
    let m = t.record_result("m-A1", 2, 1).unwrap();
    assert_eq!(m.status, MatchStatus::Finished);
    assert_eq!(m.scores(), Some((2, 1)));
    assert_eq!(
      t.record_result("m-ZZ", 1, 0).unwrap_err(),
      MatchError::UnknownMatch { match_id: "m-ZZ".to_string() }
    );
  }

  #[test]
  fn test_start_due_matches_only_touches_scheduled() {
    let mut t = Tournament::world_cup_2026().unwrap();
    let a1 = t.get_match("m-A1").unwrap().date;
    t.record_result("m-A1", 3, 0).unwrap();

    assert!(t.start_due_matches(a1 - chrono::Duration::seconds(1)).is_empty());
    let a2 = t.get_match("m-A2").unwrap().date;
    let started = t.start_due_matches(a2);
    assert_eq!(started, vec!["m-A2".to_string()]);
    let m = t.get_match("m-A2").unwrap();
    assert_eq!(m.status, MatchStatus::InProgress);
    assert_eq!(m.scores(), Some((0, 0)));
    assert_eq!(t.get_match("m-A1").unwrap().scores(), Some((3, 0)));
    assert!(t.start_due_matches(a2).is_empty());
  }

  #[test]
  fn test_update_match_replaces_fields() {
    let mut t = Tournament::world_cup_2026().unwrap();
    let mut r32 = t.get_match("m-R32-1").unwrap().clone();
    r32.away_team_id = "Brasil".to_string();
    t.update_match(r32).unwrap();
    assert_eq!(t.get_match("m-R32-1").unwrap().away_team_id, "Brasil");

    let mut ghost = t.get_match("m-A1").unwrap().clone();
    ghost.id = "m-ZZ".to_string();
    assert!(t.update_match(ghost).is_err());
  }

  #[test]
  fn test_recorded_results_feed_standings_and_leaderboard() {
    let mut t = Tournament::world_cup_2026().unwrap();
    let home = t.get_match("m-A1").unwrap().home_team_id.clone();
    t.record_result("m-A1", 2, 0).unwrap();

    let resolved = resolve_tournament(&t, &t.matches);
    assert_eq!(resolved.standings["A"][0].team_id, home);
    assert_eq!(resolved.standings["A"][0].points, 3);

    let league = League {
      id: "l1".to_string(),
      name: "Firma".to_string(),
      admin_id: "ana".to_string(),
      is_private: false,
      participants: vec!["ana".to_string()],
      pending_requests: Vec::new(),
      settings: LeagueSettings::default(),
    };
    let predictions = vec![Prediction {
      user_id: "ana".to_string(),
      match_id: "m-A1".to_string(),
      league_id: "l1".to_string(),
      home_score: 2,
      away_score: 0,
    }];
    let entries = leaderboard(&league, &t.matches, &predictions, LeaderboardView::Total);
    assert_eq!(entries[0].total_points, 10);
  }
}
