use crate::scoring::calculate_points;
use crate::standings::match_round;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardView {
    Total,
    /// Group-stage round 1, 2 or 3.
    Round(u8),
    GroupPhase,
    Knockout,
}

impl LeaderboardView {
    /// Parse the query form: `total`, `1`..`3`, `group_phase`, `knockout`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "total" => Some(LeaderboardView::Total),
            "group_phase" | "groups" => Some(LeaderboardView::GroupPhase),
            "knockout" => Some(LeaderboardView::Knockout),
            other => match other.parse::<u8>() {
                Ok(round @ 1..=3) => Some(LeaderboardView::Round(round)),
                _ => None,
            },
        }
    }

    fn includes(self, m: &Match, matches: &[Match]) -> bool {
        match self {
            LeaderboardView::Total => true,
            LeaderboardView::GroupPhase => m.phase == Phase::Group,
            LeaderboardView::Knockout => m.phase.is_knockout(),
            LeaderboardView::Round(round) => match_round(m, matches) == Some(round),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub total_points: u32,
    pub exact_scores: u32,
}

fn scored_matches<'a>(matches: &'a [Match], view: LeaderboardView) -> HashMap<&'a str, (u32, u32)> {
    matches
        .iter()
        .filter(|m| m.is_live_or_finished() && view.includes(m, matches))
        .filter_map(|m| Some((m.id.as_str(), m.scores()?)))
        .collect()
}

/// League ranking: points desc, exact scores desc, user id asc.
pub fn leaderboard(
    league: &League,
    matches: &[Match],
    predictions: &[Prediction],
    view: LeaderboardView,
) -> Vec<LeaderboardEntry> {
    let scored = scored_matches(matches, view);
    let mut entries: Vec<LeaderboardEntry> = league
        .participants
        .iter()
        .map(|user_id| LeaderboardEntry {
            user_id: user_id.clone(),
            total_points: 0,
            exact_scores: 0,
        })
        .collect();
    let positions: HashMap<String, usize> = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| (entry.user_id.clone(), idx))
        .collect();

    for p in predictions.iter().filter(|p| p.league_id == league.id) {
        let Some(&actual) = scored.get(p.match_id.as_str()) else {
            continue;
        };
        let Some(&idx) = positions.get(&p.user_id) else {
            continue;
        };
        let predicted = (p.home_score, p.away_score);
        entries[idx].total_points += calculate_points(predicted, actual, &league.settings);
        if predicted == actual {
            entries[idx].exact_scores += 1;
        }
    }

    entries.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then(b.exact_scores.cmp(&a.exact_scores))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    entries
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPredictionRow {
    pub user_id: String,
    pub home_score: u32,
    pub away_score: u32,
    pub points: Option<u32>,
}

/// Everyone's prediction for one match, best scorers first.
pub fn match_breakdown(league: &League, m: &Match, predictions: &[Prediction]) -> Vec<MatchPredictionRow> {
    let actual = m.scores().filter(|_| m.is_live_or_finished());
    let mut rows: Vec<MatchPredictionRow> = predictions
        .iter()
        .filter(|p| p.league_id == league.id && p.match_id == m.id && league.is_participant(&p.user_id))
        .map(|p| MatchPredictionRow {
            user_id: p.user_id.clone(),
            home_score: p.home_score,
            away_score: p.away_score,
            points: actual.map(|actual| calculate_points((p.home_score, p.away_score), actual, &league.settings)),
        })
        .collect();
    rows.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.user_id.cmp(&b.user_id)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_league() -> League {
        League {
            id: "l1".to_string(),
            name: "Firma".to_string(),
            admin_id: "ana".to_string(),
            is_private: false,
            participants: vec!["ana".to_string(), "bia".to_string(), "caio".to_string()],
            pending_requests: Vec::new(),
            settings: LeagueSettings::default(),
        }
    }

    fn make_match(id: &str, phase: Phase, day: i64, score: Option<(u32, u32)>) -> Match {
        Match {
            id: id.to_string(),
            home_team_id: "Brasil".to_string(),
            away_team_id: "Marrocos".to_string(),
            home_score: score.map(|s| s.0),
            away_score: score.map(|s| s.1),
            date: Utc.with_ymd_and_hms(2026, 6, 13, 22, 0, 0).unwrap() + Duration::days(day),
            phase,
            group: (phase == Phase::Group).then(|| "C".to_string()),
            status: if score.is_some() { MatchStatus::Finished } else { MatchStatus::Scheduled },
            location: String::new(),
        }
    }

    fn make_prediction(user: &str, match_id: &str, home: u32, away: u32) -> Prediction {
        Prediction {
            user_id: user.to_string(),
            match_id: match_id.to_string(),
            league_id: "l1".to_string(),
            home_score: home,
            away_score: away,
        }
    }

    fn make_fixture() -> (Vec<Match>, Vec<Prediction>) {
        let matches = vec![
            make_match("m-C1", Phase::Group, 0, Some((2, 1))),
            make_match("m-C2", Phase::Group, 0, Some((0, 0))),
            make_match("m-C3", Phase::Group, 6, Some((3, 0))),
            make_match("m-R32-9", Phase::Round32, 16, Some((1, 0))),
            make_match("m-R16-5", Phase::Round16, 22, None),
        ];
        let predictions = vec![
            make_prediction("ana", "m-C1", 2, 1),   // exact 10
            make_prediction("ana", "m-C2", 1, 1),   // draw 7
            make_prediction("bia", "m-C1", 3, 2),   // winner+diff 7
            make_prediction("bia", "m-C2", 0, 0),   // exact 10
            make_prediction("bia", "m-R32-9", 2, 0), // winner 5
            make_prediction("caio", "m-C3", 0, 1),  // 0
            make_prediction("caio", "m-R16-5", 1, 0), // unscored
            make_prediction("zeca", "m-C1", 2, 1),  // not a participant
        ];
        (matches, predictions)
    }

    #[test]
    fn test_total_leaderboard_order() {
        let (matches, predictions) = make_fixture();
        let board = leaderboard(&make_league(), &matches, &predictions, LeaderboardView::Total);
        let summary: Vec<(&str, u32, u32)> = board
            .iter()
            .map(|e| (e.user_id.as_str(), e.total_points, e.exact_scores))
            .collect();
        assert_eq!(summary, vec![("bia", 22, 1), ("ana", 17, 1), ("caio", 0, 0)]);
    }

    #[test]
    fn test_ties_break_on_exact_scores() {
        let (matches, _) = make_fixture();
        let predictions = vec![
            make_prediction("ana", "m-C1", 3, 2),  // 7
            make_prediction("ana", "m-C2", 1, 1),  // 7
            make_prediction("bia", "m-C1", 2, 1),  // 10
            make_prediction("bia", "m-C3", 1, 0),  // 4
            make_prediction("bia", "m-C2", 1, 0),  // 0
        ];
        let mut league = make_league();
        league.settings.winner = 4;
        let board = leaderboard(&league, &matches, &predictions, LeaderboardView::Total);
        assert_eq!(board[0].user_id, "bia");
        assert_eq!(board[0].total_points, 14);
        assert_eq!(board[1].user_id, "ana");
        assert_eq!(board[1].total_points, 14);
    }

    #[test]
    fn test_views_filter_matches() {
        let (matches, predictions) = make_fixture();
        let league = make_league();
        let points = |view: LeaderboardView| -> Vec<(String, u32)> {
            let mut out: Vec<(String, u32)> = leaderboard(&league, &matches, &predictions, view)
                .into_iter()
                .map(|e| (e.user_id, e.total_points))
                .collect();
            out.sort();
            out
        };
        assert_eq!(
            points(LeaderboardView::Knockout),
            vec![("ana".to_string(), 0), ("bia".to_string(), 5), ("caio".to_string(), 0)]
        );
        assert_eq!(
            points(LeaderboardView::GroupPhase),
            vec![("ana".to_string(), 17), ("bia".to_string(), 17), ("caio".to_string(), 0)]
        );
        assert_eq!(
            points(LeaderboardView::Round(1)),
            vec![("ana".to_string(), 17), ("bia".to_string(), 17), ("caio".to_string(), 0)]
        );
        assert_eq!(
            points(LeaderboardView::Round(2)),
            vec![("ana".to_string(), 0), ("bia".to_string(), 0), ("caio".to_string(), 0)]
        );
    }

    #[test]
    fn test_view_parse() {
        assert_eq!(LeaderboardView::parse("total"), Some(LeaderboardView::Total));
        assert_eq!(LeaderboardView::parse("2"), Some(LeaderboardView::Round(2)));
        assert_eq!(LeaderboardView::parse("GROUP_PHASE"), Some(LeaderboardView::GroupPhase));
        assert_eq!(LeaderboardView::parse("knockout"), Some(LeaderboardView::Knockout));
        assert_eq!(LeaderboardView::parse("4"), None);
        assert_eq!(LeaderboardView::parse("weekly"), None);
    }

    #[test]
    fn test_match_breakdown() {
        let (matches, predictions) = make_fixture();
        let league = make_league();
        let rows = match_breakdown(&league, &matches[0], &predictions);
        let summary: Vec<(&str, Option<u32>)> = rows.iter().map(|r| (r.user_id.as_str(), r.points)).collect();
        assert_eq!(summary, vec![("ana", Some(10)), ("bia", Some(7))]);

        let pending = match_breakdown(&league, &matches[4], &predictions);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].points, None);
    }
}
