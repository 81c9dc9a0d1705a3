//! Scoring engine.
//!
//! Derives view state from a tournament snapshot:
//! - Match buckets (ongoing / upcoming / past)
//! - Round-robin standings (wins, losses, ties, points, ippons)
//! - Tournament winner
//!
//! Every function here is a pure, synchronous function of the snapshot it
//! is handed. Nothing is carried over between snapshots.

mod classify;
mod outcome;
mod standings;

pub use classify::*;
pub use outcome::*;
pub use standings::*;

use thiserror::Error;

use crate::models::{MatchId, UserId};

/// Precondition violations found while deriving view state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("Match {match_id} references player {player_id} who is not registered")]
    UnknownPlayer { match_id: MatchId, player_id: UserId },

    #[error("Match {0} is a bye and has no opponent")]
    ByeMatch(MatchId),

    #[error("Match {match_id} has {count} players, expected 1 or 2")]
    InvalidParticipants { match_id: MatchId, count: usize },

    #[error("Match {match_id} winner {winner} is not one of its players")]
    WinnerNotParticipant { match_id: MatchId, winner: UserId },

    #[error("Match {match_id} has a non-finite {field}")]
    InvalidMatchTime {
        match_id: MatchId,
        field: &'static str,
    },

    #[error("Match {match_id} pushes a standings counter past its maximum")]
    CounterOverflow { match_id: MatchId },
}
