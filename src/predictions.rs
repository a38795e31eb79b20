use crate::error::PredictionError;
use crate::types::*;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub fn is_prediction_locked(kickoff: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= kickoff - Duration::minutes(PREDICTION_LOCK_MINUTES)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionInput {
    pub match_id: String,
    pub home_score: i64,
    pub away_score: i64,
}

impl PredictionInput {
    pub fn new(match_id: &str, home_score: i64, away_score: i64) -> Self {
        Self {
            match_id: match_id.to_string(),
            home_score,
            away_score,
        }
    }

    pub fn validate(&self) -> Result<(u32, u32), PredictionError> {
        if self.home_score < 0 || self.away_score < 0 {
            return Err(PredictionError::NegativeScore {
                home: self.home_score,
                away: self.away_score,
            });
        }
        let home = u32::try_from(self.home_score)
            .map_err(|_| PredictionError::ScoreOutOfRange { value: self.home_score })?;
        let away = u32::try_from(self.away_score)
            .map_err(|_| PredictionError::ScoreOutOfRange { value: self.away_score })?;
        Ok((home, away))
    }
}

#[derive(Debug, Default)]
pub struct SubmitReport {
    pub accepted: Vec<String>,
    pub rejected: Vec<(String, PredictionError)>,
}

/// All predictions, one per (user, match, league).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionBook {
    predictions: Vec<Prediction>,
}

impl PredictionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_predictions(predictions: Vec<Prediction>) -> Self {
        let mut book = Self::new();
        for prediction in predictions {
            book.upsert(prediction);
        }
        book
    }

    pub fn all(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn get(&self, user_id: &str, match_id: &str, league_id: &str) -> Option<&Prediction> {
        self.predictions
            .iter()
            .find(|p| p.user_id == user_id && p.match_id == match_id && p.league_id == league_id)
    }

    pub fn for_league<'a>(&'a self, league_id: &'a str) -> impl Iterator<Item = &'a Prediction> + 'a {
        self.predictions.iter().filter(move |p| p.league_id == league_id)
    }

    pub fn for_user_in_league<'a>(
        &'a self,
        user_id: &'a str,
        league_id: &'a str,
    ) -> impl Iterator<Item = &'a Prediction> + 'a {
        self.for_league(league_id).filter(move |p| p.user_id == user_id)
    }

    /// Insert or replace; returns true when an earlier prediction was replaced.
    pub fn upsert(&mut self, prediction: Prediction) -> bool {
        let existing = self.predictions.iter_mut().find(|p| {
            p.user_id == prediction.user_id
                && p.match_id == prediction.match_id
                && p.league_id == prediction.league_id
        });
        match existing {
            Some(slot) => {
                *slot = prediction;
                true
            }
            None => {
                self.predictions.push(prediction);
                false
            }
        }
    }

    pub fn submit(
        &mut self,
        league: &League,
        user_id: &str,
        input: &PredictionInput,
        matches: &[Match],
        now: DateTime<Utc>,
    ) -> Result<(), PredictionError> {
        let (home_score, away_score) = input.validate()?;
        if !league.participants.iter().any(|p| p == user_id) {
            return Err(PredictionError::NotParticipant {
                user_id: user_id.to_string(),
                league_id: league.id.clone(),
            });
        }
        let Some(m) = matches.iter().find(|m| m.id == input.match_id) else {
            return Err(PredictionError::UnknownMatch {
                match_id: input.match_id.clone(),
            });
        };
        if is_prediction_locked(m.date, now) {
            return Err(PredictionError::Locked {
                match_id: m.id.clone(),
            });
        }

        let replaced = self.upsert(Prediction {
            user_id: user_id.to_string(),
            match_id: m.id.clone(),
            league_id: league.id.clone(),
            home_score,
            away_score,
        });
        debug!(user_id, match_id = %m.id, league_id = %league.id, replaced, "prediction stored");
        Ok(())
    }

    /// Submit a batch; each entry is accepted or rejected on its own.
    pub fn submit_many(
        &mut self,
        league: &League,
        user_id: &str,
        inputs: &[PredictionInput],
        matches: &[Match],
        now: DateTime<Utc>,
    ) -> SubmitReport {
        let mut report = SubmitReport::default();
        for input in inputs {
            match self.submit(league, user_id, input, matches, now) {
                Ok(()) => report.accepted.push(input.match_id.clone()),
                Err(err) => report.rejected.push((input.match_id.clone(), err)),
            }
        }
        info!(
            user_id,
            league_id = %league.id,
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            "prediction batch submitted"
        );
        report
    }
}
