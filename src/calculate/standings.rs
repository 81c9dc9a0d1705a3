//! Round-robin standings aggregation.

use std::collections::HashSet;

use tracing::debug;

use super::ScoringError;
use crate::models::{Match, MatchId, ScoringRules, Tournament, TournamentPlayer, User, UserId};

/// Ordered collection of player records.
///
/// Records are appended the first time a player is seen and never removed.
/// Existing records keep their position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Standings {
    players: Vec<TournamentPlayer>,
}

impl Standings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_players(players: Vec<TournamentPlayer>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &[TournamentPlayer] {
        &self.players
    }

    pub fn into_players(self) -> Vec<TournamentPlayer> {
        self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: &UserId) -> Option<&TournamentPlayer> {
        self.players.iter().find(|p| &p.id == id)
    }

    fn position(&self, match_id: &MatchId, id: &UserId) -> Result<usize, ScoringError> {
        self.players
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| ScoringError::UnknownPlayer {
                match_id: match_id.clone(),
                player_id: id.clone(),
            })
    }

    /// Append a zeroed record for every roster entry not yet present.
    pub fn ensure_players(&mut self, roster: &[User]) {
        for user in roster {
            if self.get(&user.id).is_none() {
                self.players.push(TournamentPlayer::new(user));
            }
        }
    }

    /// Fold a schedule into the records, one pass, each match id at most once.
    ///
    /// Playoff matches and byes are skipped. A match is validated in full
    /// before any counter moves, so an error never leaves it half applied.
    pub fn apply_matches(
        &mut self,
        schedule: &[Match],
        rules: &ScoringRules,
    ) -> Result<(), ScoringError> {
        let mut processed: HashSet<&MatchId> = HashSet::new();

        for m in schedule {
            if !processed.insert(&m.id) {
                debug!(match_id = %m.id, "Skipping duplicate match");
                continue;
            }
            if m.is_playoff() {
                debug!(match_id = %m.id, "Skipping playoff match");
                continue;
            }
            if m.is_bye() {
                debug!(match_id = %m.id, "Skipping bye");
                continue;
            }

            self.apply_match(m, rules)?;
        }

        Ok(())
    }

    fn apply_match(&mut self, m: &Match, rules: &ScoringRules) -> Result<(), ScoringError> {
        let (player1, player2) =
            m.opponents()
                .ok_or_else(|| ScoringError::InvalidParticipants {
                    match_id: m.id.clone(),
                    count: m.players.len(),
                })?;

        let p1 = self.position(&m.id, &player1.id)?;
        let p2 = self.position(&m.id, &player2.id)?;

        let first_won = match &m.winner {
            Some(winner) if winner == &player1.id => Some(true),
            Some(winner) if winner == &player2.id => Some(false),
            Some(winner) => {
                return Err(ScoringError::WinnerNotParticipant {
                    match_id: m.id.clone(),
                    winner: winner.clone(),
                })
            }
            None => None,
        };

        let mut tally1 = Tally {
            ippons: m.player1_score,
            ..Tally::default()
        };
        let mut tally2 = Tally {
            ippons: m.player2_score,
            ..Tally::default()
        };

        match first_won {
            Some(first) => {
                let (winner, loser) = if first {
                    (&mut tally1, &mut tally2)
                } else {
                    (&mut tally2, &mut tally1)
                };
                winner.wins = 1;
                winner.points = rules.win_points;
                loser.losses = 1;
            }
            None if m.is_tie() => {
                for tally in [&mut tally1, &mut tally2] {
                    tally.ties = 1;
                    tally.points = rules.tie_points;
                }
            }
            None => {}
        }

        let overflow = || ScoringError::CounterOverflow {
            match_id: m.id.clone(),
        };

        if p1 == p2 {
            let merged = tally1.merge(tally2).ok_or_else(overflow)?;
            self.players[p1] = merged.apply_to(&self.players[p1]).ok_or_else(overflow)?;
        } else {
            let record1 = tally1.apply_to(&self.players[p1]).ok_or_else(overflow)?;
            let record2 = tally2.apply_to(&self.players[p2]).ok_or_else(overflow)?;
            self.players[p1] = record1;
            self.players[p2] = record2;
        }

        Ok(())
    }

    /// Records ordered by points, highest first. Equal points keep their
    /// insertion order; no secondary key is applied.
    pub fn sorted_by_points(&self) -> Vec<&TournamentPlayer> {
        let mut sorted: Vec<_> = self.players.iter().collect();
        sorted.sort_by(|a, b| b.points.cmp(&a.points));
        sorted
    }
}

/// Counter changes one match makes to one record.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    points: u32,
    ippons: u32,
    wins: u32,
    losses: u32,
    ties: u32,
}

impl Tally {
    fn merge(self, other: Tally) -> Option<Tally> {
        Some(Tally {
            points: self.points.checked_add(other.points)?,
            ippons: self.ippons.checked_add(other.ippons)?,
            wins: self.wins.checked_add(other.wins)?,
            losses: self.losses.checked_add(other.losses)?,
            ties: self.ties.checked_add(other.ties)?,
        })
    }

    /// `player` with this tally added, or `None` if a counter would overflow.
    fn apply_to(self, player: &TournamentPlayer) -> Option<TournamentPlayer> {
        Some(TournamentPlayer {
            points: player.points.checked_add(self.points)?,
            ippons: player.ippons.checked_add(self.ippons)?,
            wins: player.wins.checked_add(self.wins)?,
            losses: player.losses.checked_add(self.losses)?,
            ties: player.ties.checked_add(self.ties)?,
            ..player.clone()
        })
    }
}

/// Standings for a snapshot, recomputed from zero.
pub fn aggregate(tournament: &Tournament) -> Result<Standings, ScoringError> {
    aggregate_with(tournament, &ScoringRules::default())
}

/// [`aggregate`] with custom point values.
pub fn aggregate_with(
    tournament: &Tournament,
    rules: &ScoringRules,
) -> Result<Standings, ScoringError> {
    let mut standings = Standings::new();
    standings.ensure_players(&tournament.players);
    standings.apply_matches(&tournament.match_schedule, rules)?;
    Ok(standings)
}
