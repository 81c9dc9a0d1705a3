//! Match model: a single scheduled bout between one or two players.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MatchId, User, UserId};

/// Kind of match. Anything the backend sends other than `"playoff"` is
/// treated as part of the preliminary round robin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Playoff,
    #[serde(other)]
    Other,
}

/// A scheduled match as it appears in a tournament snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Unique identifier
    pub id: MatchId,

    /// One player for a bye, two otherwise
    pub players: Vec<User>,

    pub player1_score: u32,

    pub player2_score: u32,

    /// Declared winner, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<UserId>,

    /// Seconds elapsed on the match clock
    pub elapsed_time: f64,

    /// Configured match duration in seconds
    pub match_time: f64,

    /// Set by the backend once the match has been closed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<DateTime<Utc>>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_keeper: Option<UserId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_maker: Option<UserId>,
}

/// Outcome of a match from one participant's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Won,
    Lost,
    Tied,
    Pending,
}

/// Which officials still have to be assigned to a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingOfficials {
    None,
    TimeKeeper,
    PointMaker,
    Both,
}

impl Match {
    /// Create an unplayed two-player match.
    pub fn new(id: impl Into<MatchId>, player1: User, player2: User, match_time: f64) -> Self {
        Self {
            id: id.into(),
            players: vec![player1, player2],
            player1_score: 0,
            player2_score: 0,
            winner: None,
            elapsed_time: 0.0,
            match_time,
            end_timestamp: None,
            match_type: None,
            time_keeper: None,
            point_maker: None,
        }
    }

    /// A match slot with a single participant.
    pub fn is_bye(&self) -> bool {
        self.players.len() == 1
    }

    pub fn is_playoff(&self) -> bool {
        self.match_type == Some(MatchType::Playoff)
    }

    /// The backend has closed the match.
    pub fn has_ended(&self) -> bool {
        self.end_timestamp.is_some()
    }

    /// The clock has reached the configured duration.
    pub fn time_expired(&self) -> bool {
        self.elapsed_time >= self.match_time
    }

    /// No winner, and the match is either closed or out of time.
    pub fn is_tie(&self) -> bool {
        self.winner.is_none() && (self.has_ended() || self.time_expired())
    }

    /// Both participants, or `None` for byes and malformed player lists.
    pub fn opponents(&self) -> Option<(&User, &User)> {
        match self.players.as_slice() {
            [player1, player2] => Some((player1, player2)),
            _ => None,
        }
    }

    pub fn involves(&self, user_id: &UserId) -> bool {
        self.players.iter().any(|p| &p.id == user_id)
    }

    /// Result for `user_id`, or `None` if they did not take part.
    pub fn result_for(&self, user_id: &UserId) -> Option<MatchResult> {
        if !self.involves(user_id) {
            return None;
        }

        let result = match &self.winner {
            Some(winner) if winner == user_id => MatchResult::Won,
            Some(_) => MatchResult::Lost,
            None if self.is_tie() => MatchResult::Tied,
            None => MatchResult::Pending,
        };
        Some(result)
    }

    /// Score as shown on bracket cards, e.g. "3 - 1".
    pub fn score_line(&self) -> String {
        format!("{} - {}", self.player1_score, self.player2_score)
    }

    pub fn missing_officials(&self) -> MissingOfficials {
        match (&self.time_keeper, &self.point_maker) {
            (None, None) => MissingOfficials::Both,
            (None, Some(_)) => MissingOfficials::TimeKeeper,
            (Some(_), None) => MissingOfficials::PointMaker,
            (Some(_), Some(_)) => MissingOfficials::None,
        }
    }
}
