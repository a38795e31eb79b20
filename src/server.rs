use crate::leaderboard::{leaderboard, match_breakdown, LeaderboardView};
use crate::scoring::prediction_distribution;
use crate::types::*;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

// ── Payloads ───────────────────────────────────────────────────────────

pub fn state_payload(state: &AppState) -> Value {
    let tournament = state.tournament.lock().unwrap_or_else(|e| e.into_inner());
    let simulation = state.simulation.lock().unwrap_or_else(|e| e.into_inner());
    let projected = simulation.project(&tournament);
    json!({
        "tournament": tournament.name,
        "simulatedMatches": simulation.len(),
        "matches": projected.matches,
        "standings": projected.standings,
    })
}

pub fn leaderboard_payload(state: &AppState, league_id: &str, view: Option<&str>) -> Result<Value, (StatusCode, String)> {
    let view = match view {
        Some(raw) => LeaderboardView::parse(raw)
            .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("unknown leaderboard view {raw:?}")))?,
        None => LeaderboardView::Total,
    };
    let league = state
        .leagues
        .get(league_id)
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;
    let tournament = state.tournament.lock().unwrap_or_else(|e| e.into_inner());
    let book = state.predictions.lock().unwrap_or_else(|e| e.into_inner());
    let entries = leaderboard(&league, &tournament.matches, book.all(), view);
    Ok(json!({
        "leagueId": league.id,
        "name": league.name,
        "entries": entries,
    }))
}

pub fn match_payload(state: &AppState, league_id: &str, match_id: &str) -> Result<Value, (StatusCode, String)> {
    let league = state
        .leagues
        .get(league_id)
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;
    let tournament = state.tournament.lock().unwrap_or_else(|e| e.into_inner());
    let m = tournament
        .get_match(match_id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("match {match_id} not found")))?;
    let book = state.predictions.lock().unwrap_or_else(|e| e.into_inner());
    Ok(json!({
        "match": m,
        "predictions": match_breakdown(&league, m, book.all()),
        "distribution": prediction_distribution(book.all(), &league.id, &m.id),
    }))
}

// ── Handlers ───────────────────────────────────────────────────────────

fn json_response(result: Result<Value, (StatusCode, String)>) -> Response {
    let (status, payload) = match result {
        Ok(payload) => (StatusCode::OK, payload),
        Err((status, message)) => (status, json!({ "error": message })),
    };
    let body = serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string());
    (
        status,
        [
            ("Content-Type", "application/json"),
            ("Cache-Control", "no-store"),
            ("Pragma", "no-cache"),
            ("Expires", "0"),
        ],
        body,
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct LeaderboardQuery {
    view: Option<String>,
}

async fn get_health() -> Response {
    json_response(Ok(json!({ "status": "ok" })))
}

async fn get_state_json(State(state): State<AppState>) -> Response {
    json_response(Ok(state_payload(&state)))
}

async fn get_leaderboard_json(
    State(state): State<AppState>,
    Path(league_id): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Response {
    json_response(leaderboard_payload(&state, &league_id, query.view.as_deref()))
}

async fn get_match_json(
    State(state): State<AppState>,
    Path((league_id, match_id)): Path<(String, String)>,
) -> Response {
    json_response(match_payload(&state, &league_id, &match_id))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/state.json", get(get_state_json))
        .route("/leagues/:id/leaderboard.json", get(get_leaderboard_json))
        .route("/leagues/:id/matches/:match_id", get(get_match_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_state_server(state: AppState, addr: &str) -> Result<(), String> {
    let app = router(state);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("state server failed to bind {addr}: {e}");
            return Err(format!("bind {addr}: {e}"));
        }
    };
    info!("state server listening at http://{addr}/");
    axum::serve(listener, app).await.map_err(|e| {
        error!("state server error: {e}");
        e.to_string()
    })
}
