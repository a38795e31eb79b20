pub mod types;
pub mod error;
pub mod config;
pub mod tournament;
pub mod standings;
pub mod bracket;
pub mod scoring;
pub mod predictions;
pub mod leagues;
pub mod leaderboard;
pub mod simulation;
pub mod server;

use types::*;
use config::*;
use leagues::{LeagueRegistry, LeagueStore};
use predictions::PredictionBook;
use simulation::Simulation;
use tournament::Tournament;

use std::{
    fs,
    sync::{Arc, Mutex},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ── State loading ──────────────────────────────────────────────────────

fn load_tournament(config: &AppConfig) -> Result<Tournament, String> {
    match resolve_optional_path(&config.tournament_path) {
        Some(path) if path.is_file() => Tournament::load_from(&path),
        _ => Tournament::world_cup_2026(),
    }
}

pub fn load_app_state(config: &AppConfig) -> Result<AppState, String> {
    let tournament = load_tournament(config)?;
    info!(
        name = %tournament.name,
        groups = tournament.groups.len(),
        matches = tournament.matches.len(),
        "tournament loaded"
    );

    let simulation = match resolve_optional_path(&config.simulation_path) {
        Some(path) => Simulation::load(&path)?,
        None => Simulation::new(),
    };
    let registry: LeagueRegistry = match resolve_optional_path(&config.leagues_path) {
        Some(path) => load_json_or_default(&path, "leagues")?,
        None => LeagueRegistry::default(),
    };
    let book: PredictionBook = match resolve_optional_path(&config.predictions_path) {
        Some(path) => load_json_or_default(&path, "predictions")?,
        None => PredictionBook::new(),
    };
    info!(
        simulated = simulation.len(),
        leagues = registry.leagues.len(),
        predictions = book.len(),
        "snapshots loaded"
    );

    Ok(AppState {
        tournament: Arc::new(Mutex::new(tournament)),
        simulation: Arc::new(Mutex::new(simulation)),
        leagues: LeagueStore::new(registry),
        predictions: Arc::new(Mutex::new(book)),
    })
}

// ── Entry point ────────────────────────────────────────────────────────

pub fn run() -> Result<(), String> {
    let env_keys = load_env_file();

    let logs_dir = logs_dir();
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!(env_keys, "Palpiteiro starting");

    let config = load_config_inner().unwrap_or_else(|e| {
        warn!("config unreadable, using defaults: {e}");
        apply_env_defaults(AppConfig::default())
    });
    log_env_warnings(&config);

    let state = load_app_state(&config)?;
    tournament::spawn_kickoff_watcher(state.tournament.clone());
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("start runtime: {e}"))?;
    runtime.block_on(server::start_state_server(state, &config.bind_addr))
}
