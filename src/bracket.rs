use crate::standings::calculate_standings;
use crate::tournament::Tournament;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::{
  cmp::Ordering,
  collections::{BTreeMap, HashMap, HashSet},
};
use tracing::{debug, warn};

// ── Placeholder grammar ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotSource {
  Team(TeamId),
  GroupPosition { rank: usize, group: String },
  /// `"3º Grupo A/B/C/D/F"`
  ThirdPlace { groups: Vec<String> },
  Winner(String),
  Loser(String),
  Conflict,
}

impl SlotSource {
  pub fn parse(raw: &str) -> SlotSource {
    let trimmed = raw.trim();
    if trimmed == THIRD_PLACE_CONFLICT {
      return SlotSource::Conflict;
    }
    if let Some(rest) = trimmed.strip_prefix("Venc. ") {
      return SlotSource::Winner(rest.trim().to_string());
    }
    if let Some(rest) = trimmed.strip_prefix("Perd. ") {
      return SlotSource::Loser(rest.trim().to_string());
    }
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    if let [rank, "Grupo", group] = parts.as_slice() {
      let rank = rank.trim_end_matches(&['º', 'ª', '°'][..]).parse::<usize>();
      if let Ok(rank) = rank {
        if rank == 3 && group.contains('/') {
          let groups = group
            .split('/')
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
          return SlotSource::ThirdPlace { groups };
        }
        return SlotSource::GroupPosition {
          rank,
          group: group.to_string(),
        };
      }
    }
    SlotSource::Team(trimmed.to_string())
  }

  pub fn is_concrete(&self) -> bool {
    matches!(self, SlotSource::Team(_))
  }
}

pub fn is_concrete_team(raw: &str) -> bool {
  SlotSource::parse(raw).is_concrete()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SlotResolution {
  Ready(TeamId),
  Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
  Home,
  Away,
}

fn slot_mut(m: &mut Match, side: Side) -> &mut TeamId {
  match side {
    Side::Home => &mut m.home_team_id,
    Side::Away => &mut m.away_team_id,
  }
}

fn slot(m: &Match, side: Side) -> &TeamId {
  match side {
    Side::Home => &m.home_team_id,
    Side::Away => &m.away_team_id,
  }
}

fn apply_slot_resolution(m: &mut Match, side: Side, resolution: SlotResolution) -> bool {
  match resolution {
    SlotResolution::Ready(team) => {
      let current = slot_mut(m, side);
      if *current == team {
        false
      } else {
        *current = team;
        true
      }
    }
    SlotResolution::Pending => false,
  }
}

// ── Match outcomes ─────────────────────────────────────────────────────

pub fn winner_of(m: &Match) -> Option<&TeamId> {
  decided(m).map(|(winner, _)| winner)
}

pub fn loser_of(m: &Match) -> Option<&TeamId> {
  decided(m).map(|(_, loser)| loser)
}

fn decided(m: &Match) -> Option<(&TeamId, &TeamId)> {
  if m.status != MatchStatus::Finished {
    return None;
  }
  if !is_concrete_team(&m.home_team_id) || !is_concrete_team(&m.away_team_id) {
    return None;
  }
  let (home, away) = m.scores()?;
  match home.cmp(&away) {
    Ordering::Greater => Some((&m.home_team_id, &m.away_team_id)),
    Ordering::Less => Some((&m.away_team_id, &m.home_team_id)),
    Ordering::Equal => None,
  }
}

// ── Third places ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThirdPlaceTeam {
  pub group: String,
  pub team_id: TeamId,
  pub points: u32,
  pub gd: i32,
  pub gf: u32,
}

pub fn rank_third_places(standings: &GroupStandings) -> Vec<ThirdPlaceTeam> {
  let mut thirds: Vec<ThirdPlaceTeam> = standings
    .iter()
    .filter_map(|(group, table)| {
      let row = table.get(2)?;
      Some(ThirdPlaceTeam {
        group: group.clone(),
        team_id: row.team_id.clone(),
        points: row.points,
        gd: row.gd,
        gf: row.gf,
      })
    })
    .collect();
  thirds.sort_by(|a, b| {
    b.points
      .cmp(&a.points)
      .then(b.gd.cmp(&a.gd))
      .then(b.gf.cmp(&a.gf))
      .then_with(|| a.group.cmp(&b.group))
  });
  thirds
}

#[derive(Debug, Clone)]
struct ThirdSlot {
  match_idx: usize,
  match_id: String,
  side: Side,
  eligible: Vec<String>,
}

// Keeps the assignment that fills the most slots; stops at the first complete one.
struct ThirdPlaceSearch<'a> {
  slots: &'a [ThirdSlot],
  qualifiers: &'a [ThirdPlaceTeam],
  used: Vec<bool>,
  current: Vec<Option<usize>>,
  best: Vec<Option<usize>>,
  best_filled: usize,
}

impl<'a> ThirdPlaceSearch<'a> {
  fn new(slots: &'a [ThirdSlot], qualifiers: &'a [ThirdPlaceTeam]) -> Self {
    ThirdPlaceSearch {
      slots,
      qualifiers,
      used: vec![false; qualifiers.len()],
      current: vec![None; slots.len()],
      best: vec![None; slots.len()],
      best_filled: 0,
    }
  }

  fn run(mut self) -> Vec<Option<usize>> {
    self.search(0, 0);
    self.best
  }

  fn search(&mut self, depth: usize, filled: usize) -> bool {
    if depth == self.slots.len() {
      if filled > self.best_filled {
        self.best = self.current.clone();
        self.best_filled = filled;
      }
      return filled == self.slots.len();
    }
    if filled + (self.slots.len() - depth) <= self.best_filled {
      return false;
    }

    for q in 0..self.qualifiers.len() {
      if self.used[q] || !self.slots[depth].eligible.contains(&self.qualifiers[q].group) {
        continue;
      }
      self.used[q] = true;
      self.current[depth] = Some(q);
      if self.search(depth + 1, filled + 1) {
        return true;
      }
      self.used[q] = false;
      self.current[depth] = None;
    }

    // Leave this slot empty and see how far the rest gets.
    self.search(depth + 1, filled)
  }
}

fn collect_third_slots(matches: &[Match], third_place_slots: &BTreeMap<String, Vec<String>>) -> Vec<ThirdSlot> {
  let mut slots = Vec::new();
  for (match_idx, m) in matches.iter().enumerate() {
    if m.phase == Phase::Group {
      continue;
    }
    for side in [Side::Home, Side::Away] {
      let SlotSource::ThirdPlace { groups } = SlotSource::parse(slot(m, side)) else {
        continue;
      };
      let eligible = third_place_slots.get(&m.id).cloned().unwrap_or(groups);
      slots.push(ThirdSlot {
        match_idx,
        match_id: m.id.clone(),
        side,
        eligible,
      });
    }
  }
  slots.sort_by(|a, b| {
    a.eligible
      .len()
      .cmp(&b.eligible.len())
      .then_with(|| a.match_id.cmp(&b.match_id))
  });
  slots
}

// Third-placed teams already written into a third-place match, e.g. by an admin edit.
fn placed_third_teams(
  matches: &[Match],
  third_place_slots: &BTreeMap<String, Vec<String>>,
  thirds: &[ThirdPlaceTeam],
) -> HashSet<TeamId> {
  matches
    .iter()
    .filter(|m| m.phase == Phase::Round32 || third_place_slots.contains_key(&m.id))
    .flat_map(|m| [&m.home_team_id, &m.away_team_id])
    .filter(|team| thirds.iter().any(|t| &t.team_id == *team))
    .cloned()
    .collect()
}

fn assign_third_places(
  matches: &mut [Match],
  standings: &GroupStandings,
  third_place_slots: &BTreeMap<String, Vec<String>>,
) {
  let slots = collect_third_slots(matches, third_place_slots);
  if slots.is_empty() {
    return;
  }
  let mut qualifiers = rank_third_places(standings);
  let placed = placed_third_teams(matches, third_place_slots, &qualifiers);
  let wanted = if third_place_slots.is_empty() {
    slots.len() + placed.len()
  } else {
    third_place_slots.len()
  };
  qualifiers.truncate(wanted);
  qualifiers.retain(|q| !placed.contains(&q.team_id));

  let assignment = ThirdPlaceSearch::new(&slots, &qualifiers).run();
  for (slot_def, picked) in slots.iter().zip(assignment) {
    let m = &mut matches[slot_def.match_idx];
    match picked {
      Some(q) => {
        *slot_mut(m, slot_def.side) = qualifiers[q].team_id.clone();
      }
      None => {
        warn!(
          match_id = %slot_def.match_id,
          eligible = ?slot_def.eligible,
          "no third-placed team left for slot"
        );
        *slot_mut(m, slot_def.side) = THIRD_PLACE_CONFLICT.to_string();
      }
    }
  }
}

// ── Resolution ─────────────────────────────────────────────────────────

fn resolve_group_position(source: &SlotSource, standings: &GroupStandings) -> SlotResolution {
  let SlotSource::GroupPosition { rank, group } = source else {
    return SlotResolution::Pending;
  };
  let row = rank
    .checked_sub(1)
    .and_then(|idx| standings.get(group).and_then(|table| table.get(idx)));
  match row {
    Some(row) => SlotResolution::Ready(row.team_id.clone()),
    None => {
      debug!(rank, group = %group, "group position not available");
      SlotResolution::Pending
    }
  }
}

fn find_match_ref(index: &HashMap<String, usize>, reference: &str) -> Option<usize> {
  index
    .get(reference)
    .or_else(|| index.get(&format!("m-{reference}")))
    .copied()
}

fn resolve_result_slot(source: &SlotSource, matches: &[Match], index: &HashMap<String, usize>) -> SlotResolution {
  let (reference, want_winner) = match source {
    SlotSource::Winner(reference) => (reference, true),
    SlotSource::Loser(reference) => (reference, false),
    _ => return SlotResolution::Pending,
  };
  let Some(idx) = find_match_ref(index, reference) else {
    debug!(reference = %reference, "unknown match reference");
    return SlotResolution::Pending;
  };
  let source_match = &matches[idx];
  let team = if want_winner {
    winner_of(source_match)
  } else {
    loser_of(source_match)
  };
  match team {
    Some(team) => SlotResolution::Ready(team.clone()),
    None => SlotResolution::Pending,
  }
}

/// Group positions, then third places, then winners and losers phase by phase.
/// Unresolvable slots keep their placeholder.
pub fn resolve_bracket(
  matches: &[Match],
  standings: &GroupStandings,
  third_place_slots: &BTreeMap<String, Vec<String>>,
) -> Vec<Match> {
  let mut resolved = matches.to_vec();

  for m in resolved.iter_mut().filter(|m| m.phase != Phase::Group) {
    for side in [Side::Home, Side::Away] {
      let source = SlotSource::parse(slot(m, side));
      let resolution = resolve_group_position(&source, standings);
      apply_slot_resolution(m, side, resolution);
    }
  }

  assign_third_places(&mut resolved, standings, third_place_slots);

  let index: HashMap<String, usize> = resolved
    .iter()
    .enumerate()
    .map(|(idx, m)| (m.id.clone(), idx))
    .collect();
  for phase in Phase::KNOCKOUT {
    for idx in 0..resolved.len() {
      if resolved[idx].phase != phase {
        continue;
      }
      for side in [Side::Home, Side::Away] {
        let source = SlotSource::parse(slot(&resolved[idx], side));
        let resolution = resolve_result_slot(&source, &resolved, &index);
        apply_slot_resolution(&mut resolved[idx], side, resolution);
      }
    }
  }

  resolved
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTournament {
  pub matches: Vec<Match>,
  pub standings: GroupStandings,
}

pub fn resolve_tournament(tournament: &Tournament, matches: &[Match]) -> ResolvedTournament {
  let standings = calculate_standings(&tournament.groups, matches);
  let matches = resolve_bracket(matches, &standings, &tournament.third_place_slots);
  ResolvedTournament { matches, standings }
}
