//! Tournament-level outcomes and participant checks.

use super::{aggregate_with, ScoringError};
use crate::models::{Match, ScoringRules, Tournament, User, UserId};

/// Both participants of a two-player match.
pub fn opponents(m: &Match) -> Result<(&User, &User), ScoringError> {
    match m.players.len() {
        1 => Err(ScoringError::ByeMatch(m.id.clone())),
        2 => m
            .opponents()
            .ok_or_else(|| ScoringError::ByeMatch(m.id.clone())),
        count => Err(ScoringError::InvalidParticipants {
            match_id: m.id.clone(),
            count,
        }),
    }
}

/// Winner of a finished tournament.
///
/// With playoffs, the declared winner of the last playoff match on the
/// schedule. Otherwise the sole points leader of the round robin. Returns
/// `None` while matches remain, when the lead is shared, or when the final
/// has no declared winner.
pub fn find_winner(
    tournament: &Tournament,
    rules: &ScoringRules,
) -> Result<Option<UserId>, ScoringError> {
    if !tournament.all_matches_played() {
        return Ok(None);
    }

    if tournament.has_playoffs() {
        let winner = tournament
            .match_schedule
            .iter()
            .rev()
            .find(|m| m.is_playoff())
            .and_then(|m| m.winner.clone());
        return Ok(winner);
    }

    let standings = aggregate_with(tournament, rules)?;
    let sorted = standings.sorted_by_points();
    let winner = match sorted.as_slice() {
        [first, second, ..] if first.points == second.points => None,
        [first, ..] => Some(first.id.clone()),
        [] => None,
    };
    Ok(winner)
}
