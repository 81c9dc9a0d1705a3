//! Derived scoreboard view kept current from snapshot updates.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::SnapshotUpdate;
use crate::calculate::{aggregate_with, classify, MatchBuckets, ScoringError, Standings};
use crate::models::{ScoringRules, StatColumn, Tournament, TournamentId, TournamentPlayer};

/// One scoreboard line, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreboardRow {
    /// 1-based position after sorting by points
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub stats: Vec<StatCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCell {
    pub column: StatColumn,
    pub value: u32,
}

impl ScoreboardRow {
    fn new(rank: usize, player: &TournamentPlayer, same_names: bool) -> Self {
        Self {
            rank,
            id: player.id.to_string(),
            name: player.display_name(same_names),
            stats: player
                .stat_row()
                .into_iter()
                .map(|(column, value)| StatCell { column, value })
                .collect(),
        }
    }
}

/// Scoreboard rows sorted by points, highest first.
pub fn scoreboard_rows(standings: &Standings, same_names: bool) -> Vec<ScoreboardRow> {
    standings
        .sorted_by_points()
        .into_iter()
        .enumerate()
        .map(|(i, p)| ScoreboardRow::new(i + 1, p, same_names))
        .collect()
}

/// Buckets and standings of one tournament at its latest applied revision.
pub struct ScoreboardView {
    tournament_id: TournamentId,
    rules: ScoringRules,
    revision: u64,
    tournament: Option<Arc<Tournament>>,
    buckets: MatchBuckets,
    standings: Standings,
}

impl ScoreboardView {
    pub fn new(tournament_id: TournamentId, rules: ScoringRules) -> Self {
        Self {
            tournament_id,
            rules,
            revision: 0,
            tournament: None,
            buckets: MatchBuckets::default(),
            standings: Standings::new(),
        }
    }

    /// Recompute from `update`. Returns `false` without touching the view
    /// when the update is for another tournament or not newer than the
    /// revision already shown. On error the previous state is kept.
    pub fn apply(&mut self, update: &SnapshotUpdate) -> Result<bool, ScoringError> {
        if update.tournament.id != self.tournament_id {
            return Ok(false);
        }
        if update.revision <= self.revision {
            debug!(
                tournament = %self.tournament_id,
                revision = update.revision,
                shown = self.revision,
                "Ignoring stale snapshot"
            );
            return Ok(false);
        }

        let buckets = classify(&update.tournament.match_schedule)?;
        let standings = aggregate_with(&update.tournament, &self.rules)?;

        self.buckets = buckets;
        self.standings = standings;
        self.revision = update.revision;
        self.tournament = Some(Arc::clone(&update.tournament));
        Ok(true)
    }

    pub fn tournament_id(&self) -> &TournamentId {
        &self.tournament_id
    }

    /// Revision currently shown; 0 before the first snapshot.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn tournament(&self) -> Option<&Tournament> {
        self.tournament.as_deref()
    }

    pub fn buckets(&self) -> &MatchBuckets {
        &self.buckets
    }

    pub fn standings(&self) -> &Standings {
        &self.standings
    }

    pub fn rows(&self) -> Vec<ScoreboardRow> {
        let same_names = self.tournament().is_some_and(Tournament::has_same_names);
        scoreboard_rows(&self.standings, same_names)
    }
}
