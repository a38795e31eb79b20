use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use crate::leagues::LeagueStore;
use crate::predictions::PredictionBook;
use crate::simulation::Simulation;
use crate::tournament::Tournament;

// ── Constants ──────────────────────────────────────────────────────────

pub const PREDICTION_LOCK_MINUTES: i64 = 5;
pub const THIRD_PLACE_CONFLICT: &str = "A Definir (3º)";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:17890";
pub const DEFAULT_TOURNAMENT_PATH: &str = "data/world_cup_2026.json";
pub const DELETED_LEAGUE_MARK: &str = "[EXCLUÍDA]";
pub const KICKOFF_POLL_INTERVAL_MS: u64 = 30_000;

// ── Shared state type aliases ──────────────────────────────────────────

pub type TeamId = String;
pub type GroupStandings = BTreeMap<String, Vec<GroupStanding>>;
pub type SharedTournament = Arc<Mutex<Tournament>>;
pub type SharedSimulation = Arc<Mutex<Simulation>>;
pub type SharedPredictionBook = Arc<Mutex<PredictionBook>>;

// ── Match types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "GROUP", alias = "Grupos")]
    Group,
    #[serde(rename = "ROUND_32", alias = "16-avos de Final")]
    Round32,
    #[serde(rename = "ROUND_16", alias = "Oitavas de Final")]
    Round16,
    #[serde(rename = "QUARTER", alias = "Quartas de Final")]
    Quarter,
    #[serde(rename = "SEMI", alias = "Semifinal")]
    Semi,
    /// Final and third-place match.
    #[serde(rename = "FINAL", alias = "Final")]
    Final,
}

impl Phase {
    pub const KNOCKOUT: [Phase; 5] = [
        Phase::Round32,
        Phase::Round16,
        Phase::Quarter,
        Phase::Semi,
        Phase::Final,
    ];

    pub fn is_knockout(self) -> bool {
        self != Phase::Group
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub date: DateTime<Utc>,
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub status: MatchStatus,
    #[serde(default)]
    pub location: String,
}

impl Match {
    pub fn scores(&self) -> Option<(u32, u32)> {
        Some((self.home_score?, self.away_score?))
    }

    /// Started or finished: the states that count towards standings and points.
    pub fn is_live_or_finished(&self) -> bool {
        matches!(self.status, MatchStatus::InProgress | MatchStatus::Finished)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStanding {
    pub team_id: TeamId,
    pub points: u32,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub gf: u32,
    pub ga: u32,
    pub gd: i32,
}

impl GroupStanding {
    pub fn new(team_id: TeamId) -> Self {
        GroupStanding {
            team_id,
            points: 0,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            gf: 0,
            ga: 0,
            gd: 0,
        }
    }
}

// ── League types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaguePlan {
    Free,
    VipBasic,
    Vip,
    VipMaster,
    VipUnlimited,
    /// Any plan name this build does not know; limited like FREE.
    #[serde(other)]
    Unknown,
}

impl LeaguePlan {
    /// Participant limit, `None` meaning unbounded.
    pub fn capacity(self) -> Option<usize> {
        match self {
            LeaguePlan::Free | LeaguePlan::Unknown => Some(10),
            LeaguePlan::VipBasic => Some(50),
            LeaguePlan::Vip => Some(100),
            LeaguePlan::VipMaster => Some(200),
            LeaguePlan::VipUnlimited => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueSettings {
    pub exact_score: u32,
    pub winner_and_diff: u32,
    pub winner: u32,
    pub draw: u32,
    /// Legacy flag from before plans existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_unlimited: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<LeaguePlan>,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self {
            exact_score: 10,
            winner_and_diff: 7,
            winner: 5,
            draw: 7,
            is_unlimited: None,
            plan: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: String,
    pub name: String,
    pub admin_id: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub pending_requests: Vec<String>,
    #[serde(default)]
    pub settings: LeagueSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: String,
    pub league_id: String,
    pub email: String,
    pub status: InviteStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub user_id: String,
    pub match_id: String,
    pub league_id: String,
    pub home_score: u32,
    pub away_score: u32,
}

// ── App config & server state ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub tournament_path: String,
    pub simulation_path: String,
    pub leagues_path: String,
    pub predictions_path: String,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tournament_path: DEFAULT_TOURNAMENT_PATH.to_string(),
            simulation_path: String::new(),
            leagues_path: String::new(),
            predictions_path: String::new(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub tournament: SharedTournament,
    pub simulation: SharedSimulation,
    pub leagues: LeagueStore,
    pub predictions: SharedPredictionBook,
}
