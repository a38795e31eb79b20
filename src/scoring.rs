use crate::types::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

pub fn outcome(home: u32, away: u32) -> Outcome {
    match home.cmp(&away) {
        Ordering::Greater => Outcome::Home,
        Ordering::Equal => Outcome::Draw,
        Ordering::Less => Outcome::Away,
    }
}

/// Points for one prediction against the actual score. The first category that applies wins:
/// exact score, right winner with the same goal difference, right winner, right draw.
pub fn calculate_points(predicted: (u32, u32), actual: (u32, u32), settings: &LeagueSettings) -> u32 {
    if predicted == actual {
        return settings.exact_score;
    }

    let predicted_outcome = outcome(predicted.0, predicted.1);
    if predicted_outcome != outcome(actual.0, actual.1) {
        return 0;
    }
    if predicted_outcome == Outcome::Draw {
        return settings.draw;
    }

    let predicted_diff = predicted.0 as i64 - predicted.1 as i64;
    let actual_diff = actual.0 as i64 - actual.1 as i64;
    if predicted_diff == actual_diff {
        settings.winner_and_diff
    } else {
        settings.winner
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionDistribution {
    pub home: u32,
    pub draw: u32,
    pub away: u32,
    pub total: usize,
}

/// Distribution of a league's predictions for one match; `None` when nobody predicted it.
pub fn prediction_distribution(
    predictions: &[Prediction],
    league_id: &str,
    match_id: &str,
) -> Option<PredictionDistribution> {
    let mut counts = [0usize; 3];
    for p in predictions
        .iter()
        .filter(|p| p.league_id == league_id && p.match_id == match_id)
    {
        let slot = match outcome(p.home_score, p.away_score) {
            Outcome::Home => 0,
            Outcome::Draw => 1,
            Outcome::Away => 2,
        };
        counts[slot] += 1;
    }
    let total: usize = counts.iter().sum();
    if total == 0 {
        return None;
    }
    let percent = |count: usize| ((count as f64 / total as f64) * 100.0).round() as u32;
    Some(PredictionDistribution {
        home: percent(counts[0]),
        draw: percent(counts[1]),
        away: percent(counts[2]),
        total,
    })
}
