//! Tournament snapshot model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Match, TournamentId, User, UserId};

/// A complete, self-consistent tournament snapshot as delivered by the
/// backend (initial fetch or live push).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,

    pub name: String,

    pub start_date: DateTime<Utc>,

    pub end_date: DateTime<Utc>,

    pub location: String,

    pub max_players: u32,

    pub creator: User,

    /// Registered players, unique by id
    pub players: Vec<User>,

    /// Full schedule; never paginated
    pub match_schedule: Vec<Match>,
}

impl Tournament {
    pub fn is_full(&self) -> bool {
        self.max_players as usize <= self.players.len()
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_date
    }

    /// Started with fewer than two players signed up.
    pub fn is_cancelled(&self, now: DateTime<Utc>) -> bool {
        self.has_started(now) && self.players.len() < 2
    }

    pub fn is_creator(&self, user_id: &UserId) -> bool {
        &self.creator.id == user_id
    }

    pub fn has_player(&self, user_id: &UserId) -> bool {
        self.players.iter().any(|p| &p.id == user_id)
    }

    pub fn player(&self, user_id: &UserId) -> Option<&User> {
        self.players.iter().find(|p| &p.id == user_id)
    }

    /// Full name of a registered player, or "Unknown Player".
    pub fn player_name(&self, user_id: &UserId) -> String {
        self.player(user_id)
            .map(User::full_name)
            .unwrap_or_else(|| "Unknown Player".to_string())
    }

    /// Matches `user_id` takes part in, in schedule order.
    pub fn player_matches(&self, user_id: &UserId) -> Vec<&Match> {
        self.match_schedule
            .iter()
            .filter(|m| m.involves(user_id))
            .collect()
    }

    /// Two distinct players share a first and last name.
    pub fn has_same_names(&self) -> bool {
        self.players.iter().enumerate().any(|(i, a)| {
            self.players[i + 1..]
                .iter()
                .any(|b| a.id != b.id && a.has_same_name(b))
        })
    }

    pub fn has_playoffs(&self) -> bool {
        self.match_schedule.iter().any(Match::is_playoff)
    }

    /// Every non-bye match has been closed. An empty schedule is never
    /// considered played.
    pub fn all_matches_played(&self) -> bool {
        let mut scored = self.match_schedule.iter().filter(|m| !m.is_bye()).peekable();
        scored.peek().is_some() && scored.all(Match::has_ended)
    }
}

/// Tournaments `user_id` has joined, newest start date first.
pub fn joined_tournaments<'a>(tournaments: &'a [Tournament], user_id: &UserId) -> Vec<&'a Tournament> {
    let mut joined: Vec<_> = tournaments
        .iter()
        .filter(|t| t.has_player(user_id))
        .collect();
    joined.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    joined
}
