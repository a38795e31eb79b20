use crate::types::*;
use std::{cmp::Ordering, collections::BTreeMap};
use tracing::debug;

/// Only live or finished group matches count; a missing score counts as 0.
pub fn calculate_standings(groups: &BTreeMap<String, Vec<TeamId>>, matches: &[Match]) -> GroupStandings {
  let mut standings: GroupStandings = groups
    .iter()
    .map(|(letter, teams)| (letter.clone(), teams.iter().cloned().map(GroupStanding::new).collect()))
    .collect();

  for m in matches {
    if m.phase != Phase::Group || !m.is_live_or_finished() {
      continue;
    }
    let Some(letter) = m.group.as_deref() else {
      debug!(match_id = %m.id, "group match without a group letter, skipped");
      continue;
    };
    let Some(table) = standings.get_mut(letter) else {
      debug!(match_id = %m.id, group = letter, "group not configured, skipped");
      continue;
    };
    let home_idx = table.iter().position(|s| s.team_id == m.home_team_id);
    let away_idx = table.iter().position(|s| s.team_id == m.away_team_id);
    let (Some(home_idx), Some(away_idx)) = (home_idx, away_idx) else {
      debug!(match_id = %m.id, group = letter, "team not in group, skipped");
      continue;
    };
    if home_idx == away_idx {
      debug!(match_id = %m.id, "team plays itself, skipped");
      continue;
    }

    let home_goals = m.home_score.unwrap_or(0);
    let away_goals = m.away_score.unwrap_or(0);
    record_result(&mut table[home_idx], home_goals, away_goals);
    record_result(&mut table[away_idx], away_goals, home_goals);
  }

  for table in standings.values_mut() {
    table.sort_by(compare_standing);
  }
  standings
}

fn record_result(row: &mut GroupStanding, scored: u32, conceded: u32) {
  row.played += 1;
  row.gf += scored;
  row.ga += conceded;
  row.gd = row.gf as i32 - row.ga as i32;
  match scored.cmp(&conceded) {
    Ordering::Greater => {
      row.won += 1;
      row.points += 3;
    }
    Ordering::Equal => {
      row.drawn += 1;
      row.points += 1;
    }
    Ordering::Less => row.lost += 1,
  }
}

pub fn compare_standing(a: &GroupStanding, b: &GroupStanding) -> Ordering {
  b.points
    .cmp(&a.points)
    .then(b.gd.cmp(&a.gd))
    .then(b.gf.cmp(&a.gf))
    .then_with(|| a.team_id.cmp(&b.team_id))
}

// Two matches per round, by kickoff.
pub fn match_round(m: &Match, matches: &[Match]) -> Option<u8> {
  if m.phase != Phase::Group {
    return None;
  }
  let group = m.group.as_deref()?;
  let mut group_matches: Vec<&Match> = matches
    .iter()
    .filter(|other| other.phase == Phase::Group && other.group.as_deref() == Some(group))
    .collect();
  group_matches.sort_by_key(|other| other.date);
  let index = group_matches.iter().position(|other| other.id == m.id)?;
  u8::try_from(index / 2 + 1).ok()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{TimeZone, Utc};

  fn make_groups() -> BTreeMap<String, Vec<TeamId>> {
    let mut groups = BTreeMap::new();
    groups.insert(
      "A".to_string(),
      vec!["Team1".to_string(), "Team2".to_string(), "Team3".to_string(), "Team4".to_string()],
    );
    groups
  }

  fn make_match(id: &str, home: &str, away: &str, score: Option<(u32, u32)>, day: u32) -> Match {
    Match {
      id: id.to_string(),
      home_team_id: home.to_string(),
      away_team_id: away.to_string(),
      home_score: score.map(|s| s.0),
      away_score: score.map(|s| s.1),
      date: Utc.with_ymd_and_hms(2026, 6, day, 18, 0, 0).unwrap(),
      phase: Phase::Group,
      group: Some("A".to_string()),
      status: if score.is_some() { MatchStatus::Finished } else { MatchStatus::Scheduled },
      location: String::new(),
    }
  }

  fn make_group_a() -> Vec<Match> {
    vec![
      make_match("m-A1", "Team1", "Team2", Some((2, 0)), 11),
      make_match("m-A2", "Team3", "Team4", Some((1, 1)), 11),
      make_match("m-A3", "Team1", "Team3", Some((3, 1)), 18),
      make_match("m-A4", "Team2", "Team4", Some((0, 0)), 18),
      make_match("m-A5", "Team1", "Team4", Some((2, 0)), 24),
      make_match("m-A6", "Team2", "Team3", Some((1, 2)), 24),
    ]
  }

  #[test]
  fn test_group_a_end_to_end() {
    let standings = calculate_standings(&make_groups(), &make_group_a());
    let table = &standings["A"];
    assert_eq!(table[0].team_id, "Team1");
    assert_eq!(table[0].points, 9);
    assert_eq!(table[0].gd, 6);
    assert_eq!(table[0].won, 3);
    assert_eq!(table[1].team_id, "Team3");
    assert_eq!(table[1].points, 4);
    assert_eq!(table[2].team_id, "Team4");
    assert_eq!(table[2].points, 2);
    assert_eq!(table[3].team_id, "Team2");
    assert!(table.iter().all(|row| row.played == 3));
  }

  #[test]
  fn test_group_a_clean_sweep_with_drawn_runner() {
    let matches = vec![
      make_match("m-A1", "Team1", "Team2", Some((2, 0)), 11),
      make_match("m-A2", "Team3", "Team4", Some((1, 0)), 11),
      make_match("m-A3", "Team1", "Team3", Some((2, 0)), 18),
      make_match("m-A4", "Team2", "Team4", Some((1, 1)), 18),
      make_match("m-A5", "Team4", "Team1", Some((0, 2)), 24),
      make_match("m-A6", "Team2", "Team3", Some((1, 1)), 24),
    ];
    let standings = calculate_standings(&make_groups(), &matches);
    let table = &standings["A"];
    let order: Vec<(&str, u32, i32)> = table
      .iter()
      .map(|row| (row.team_id.as_str(), row.points, row.gd))
      .collect();
    assert_eq!(
      order,
      vec![("Team1", 9, 6), ("Team3", 4, -1), ("Team2", 2, -2), ("Team4", 1, -3)]
    );
    assert_eq!(table[0].gf, 6);
    assert_eq!(table[0].ga, 0);
    assert_eq!(table[2].drawn, 2);
  }

  #[test]
  fn test_points_conservation_per_match() {
    let groups = make_groups();
    for (h, a, expected) in [(2, 0, 3), (1, 1, 2), (0, 4, 3), (0, 0, 2)] {
      let matches = vec![make_match("m-A1", "Team1", "Team2", Some((h, a)), 11)];
      let standings = calculate_standings(&groups, &matches);
      let total: u32 = standings["A"].iter().map(|row| row.points).sum();
      assert_eq!(total, expected, "{h}-{a}");
    }
  }

  #[test]
  fn test_deterministic_and_unplayed_start_at_zero() {
    let groups = make_groups();
    let matches = make_group_a();
    assert_eq!(calculate_standings(&groups, &matches), calculate_standings(&groups, &matches));

    let empty = calculate_standings(&groups, &[]);
    let ids: Vec<&str> = empty["A"].iter().map(|row| row.team_id.as_str()).collect();
    assert_eq!(ids, vec!["Team1", "Team2", "Team3", "Team4"]);
    assert!(empty["A"].iter().all(|row| row.points == 0 && row.played == 0));
  }

  #[test]
  fn test_scheduled_matches_ignored_and_in_progress_counts() {
    let groups = make_groups();
    let mut live = make_match("m-A1", "Team1", "Team2", None, 11);
    live.status = MatchStatus::InProgress;
    live.home_score = Some(1);
    let scheduled = make_match("m-A2", "Team3", "Team4", None, 11);
    let standings = calculate_standings(&groups, &[live, scheduled]);
    let table = &standings["A"];
    assert_eq!(table[0].team_id, "Team1");
    assert_eq!(table[0].points, 3);
    assert_eq!(table[0].gf, 1);
    let team3 = table.iter().find(|row| row.team_id == "Team3").unwrap();
    assert_eq!(team3.played, 0);
  }

  #[test]
  fn test_unknown_team_skipped() {
    let groups = make_groups();
    let matches = vec![
      make_match("m-A1", "Team1", "Ghost", Some((5, 0)), 11),
      make_match("m-A2", "Team3", "Team4", Some((1, 0)), 11),
    ];
    let standings = calculate_standings(&groups, &matches);
    let table = &standings["A"];
    assert_eq!(table[0].team_id, "Team3");
    assert_eq!(table.iter().map(|row| row.played).sum::<u32>(), 2);
  }

  #[test]
  fn test_match_round_by_kickoff() {
    let matches = make_group_a();
    let rounds: Vec<Option<u8>> = matches.iter().map(|m| match_round(m, &matches)).collect();
    assert_eq!(rounds, vec![Some(1), Some(1), Some(2), Some(2), Some(3), Some(3)]);

    let mut knockout = make_match("m-R32-1", "1º Grupo A", "2º Grupo B", None, 29);
    knockout.phase = Phase::Round32;
    knockout.group = None;
    assert_eq!(match_round(&knockout, &matches), None);
  }
}
