use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LeagueError {
    #[error("League {league_id} not found")]
    LeagueNotFound { league_id: String },

    #[error("Only the league admin can do that")]
    Forbidden {},

    #[error("Already a participant")]
    AlreadyParticipant {},

    #[error("Join request already pending")]
    RequestAlreadyPending {},

    #[error("League is full ({capacity} participants)")]
    LeagueFull { capacity: usize },

    #[error("No pending request for {user_id}")]
    NotPending { user_id: String },

    #[error("{user_id} is not a participant")]
    NotParticipant { user_id: String },

    #[error("Invitation {invite_id} is no longer pending")]
    InviteNotPending { invite_id: String },

    #[error("Invitation was sent to a different email")]
    InviteEmailMismatch {},

    #[error("Invitation already sent to {email}")]
    InviteAlreadySent { email: String },

    #[error("Invitation {invite_id} not found")]
    InviteNotFound { invite_id: String },

    #[error("League {league_id} already exists")]
    LeagueExists { league_id: String },

    #[error("League store unavailable: {0}")]
    StoreUnavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredictionError {
    #[error("Scores must be non-negative (got {home} x {away})")]
    NegativeScore { home: i64, away: i64 },

    #[error("Score {value} is out of range")]
    ScoreOutOfRange { value: i64 },

    #[error("Predictions for {match_id} are locked")]
    Locked { match_id: String },

    #[error("{user_id} is not a participant of league {league_id}")]
    NotParticipant { user_id: String, league_id: String },

    #[error("Unknown match {match_id}")]
    UnknownMatch { match_id: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("Unknown match {match_id}")]
    UnknownMatch { match_id: String },
}
