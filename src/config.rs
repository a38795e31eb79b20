use crate::types::*;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    env,
    fs,
    path::{Path, PathBuf},
};

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    repo_root().join(path)
  }
}

// Empty means not configured.
pub fn resolve_optional_path(raw: &str) -> Option<PathBuf> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }
  Some(resolve_repo_path(trimmed))
}

pub fn config_path() -> PathBuf {
  repo_root().join("config.json")
}

pub fn logs_dir() -> PathBuf {
  repo_root().join("logs")
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

fn fill_from_env(field: &mut String, key: &str) {
  if field.trim().is_empty() {
    if let Some(value) = env_default(key) {
      *field = value;
    }
  }
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  fill_from_env(&mut config.tournament_path, "BOLAO_TOURNAMENT_PATH");
  fill_from_env(&mut config.simulation_path, "BOLAO_SIMULATION_PATH");
  fill_from_env(&mut config.leagues_path, "BOLAO_LEAGUES_PATH");
  fill_from_env(&mut config.predictions_path, "BOLAO_PREDICTIONS_PATH");
  fill_from_env(&mut config.bind_addr, "BOLAO_BIND_ADDR");
  if config.bind_addr.trim().is_empty() {
    config.bind_addr = DEFAULT_BIND_ADDR.to_string();
  }
  config
}

pub fn load_config_inner() -> Result<AppConfig, String> {
  let path = config_path();
  if !path.is_file() {
    let config = save_config_inner(AppConfig::default())?;
    return Ok(apply_env_defaults(config));
  }
  let data = fs::read_to_string(&path).map_err(|e| format!("read config {}: {e}", path.display()))?;
  let config =
    serde_json::from_str::<AppConfig>(&data).map_err(|e| format!("parse config {}: {e}", path.display()))?;
  Ok(apply_env_defaults(config))
}

pub fn save_config_inner(config: AppConfig) -> Result<AppConfig, String> {
  let path = config_path();
  let payload = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
  fs::write(&path, payload).map_err(|e| format!("write config {}: {e}", path.display()))?;
  Ok(config)
}

// ── JSON snapshots ─────────────────────────────────────────────────────

pub fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path, label: &str) -> Result<T, String> {
  if !path.is_file() {
    return Ok(T::default());
  }
  let data = fs::read_to_string(path).map_err(|e| format!("read {label} {}: {e}", path.display()))?;
  serde_json::from_str::<T>(&data).map_err(|e| format!("parse {label} {}: {e}", path.display()))
}

pub fn save_json<T: Serialize>(path: &Path, label: &str, value: &T) -> Result<(), String> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(|e| format!("create {label} dir {}: {e}", parent.display()))?;
  }
  let payload = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
  fs::write(path, payload).map_err(|e| format!("write {label} {}: {e}", path.display()))
}

// ── .env ───────────────────────────────────────────────────────────────

pub fn load_env_file() -> usize {
  let Ok(contents) = fs::read_to_string(repo_root().join(".env")) else {
    return 0;
  };
  let mut applied = 0;
  for (key, value) in contents.lines().filter_map(parse_env_line) {
    if env::var_os(&key).is_none() {
      env::set_var(&key, value);
      applied += 1;
    }
  }
  applied
}

fn unquote(value: &str) -> Option<&str> {
  ['"', '\''].iter().find_map(|q| value.strip_prefix(*q)?.strip_suffix(*q))
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let line = line.trim();
  let line = line.strip_prefix("export ").unwrap_or(line);
  if line.starts_with('#') {
    return None;
  }
  let (key, value) = line.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  let value = value.trim();
  let value = match unquote(value) {
    Some(inner) => inner,
    None => value.split('#').next().unwrap_or_default().trim_end(),
  };
  Some((key.to_string(), value.to_string()))
}

pub fn log_env_warnings(config: &AppConfig) {
  let mut warnings = Vec::new();

  if let Some(path) = resolve_optional_path(&config.tournament_path) {
    if !path.is_file() {
      warnings.push(format!(
        "tournament file {} not found; falling back to the embedded 2026 schedule",
        path.display()
      ));
    }
  }
  if config.simulation_path.trim().is_empty() {
    warnings.push("BOLAO_SIMULATION_PATH not set and no simulation path in config; overlay starts empty".to_string());
  }
  if config.leagues_path.trim().is_empty() {
    warnings.push("BOLAO_LEAGUES_PATH not set and no leagues path in config; no leagues will be served".to_string());
  }
  if config.predictions_path.trim().is_empty() {
    warnings.push("BOLAO_PREDICTIONS_PATH not set and no predictions path in config; leaderboards will be empty".to_string());
  }

  for msg in warnings {
    tracing::warn!("{}", msg);
  }
}
