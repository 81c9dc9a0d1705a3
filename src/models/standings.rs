//! Derived standings models.

use serde::{Deserialize, Serialize};

use super::user::display_name;
use super::{User, UserId};

/// Points awarded per outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    #[serde(default = "default_win_points")]
    pub win_points: u32,

    #[serde(default = "default_tie_points")]
    pub tie_points: u32,
}

fn default_win_points() -> u32 {
    3
}

fn default_tie_points() -> u32 {
    1
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            win_points: default_win_points(),
            tie_points: default_tie_points(),
        }
    }
}

/// Per-player round-robin record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentPlayer {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub points: u32,
    pub ippons: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl TournamentPlayer {
    /// Zeroed record for a newly observed player.
    pub fn new(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            points: 0,
            ippons: 0,
            wins: 0,
            losses: 0,
            ties: 0,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Same rendering as [`User::display_name`].
    pub fn display_name(&self, same_names: bool) -> String {
        display_name(self.full_name(), &self.id, same_names)
    }

    pub fn stat(&self, column: StatColumn) -> u32 {
        match column {
            StatColumn::Points => self.points,
            StatColumn::Ippons => self.ippons,
            StatColumn::Wins => self.wins,
            StatColumn::Losses => self.losses,
            StatColumn::Ties => self.ties,
        }
    }

    /// Scoreboard row in column order.
    pub fn stat_row(&self) -> [(StatColumn, u32); 5] {
        StatColumn::ALL.map(|c| (c, self.stat(c)))
    }
}

/// Numeric scoreboard columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatColumn {
    Points,
    Ippons,
    Wins,
    Losses,
    Ties,
}

impl StatColumn {
    pub const ALL: [StatColumn; 5] = [
        StatColumn::Points,
        StatColumn::Ippons,
        StatColumn::Wins,
        StatColumn::Losses,
        StatColumn::Ties,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StatColumn::Points => "Points",
            StatColumn::Ippons => "Ippons",
            StatColumn::Wins => "Wins",
            StatColumn::Losses => "Losses",
            StatColumn::Ties => "Ties",
        }
    }
}

impl std::fmt::Display for StatColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
