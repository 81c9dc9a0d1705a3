//! Match classification.

use serde::Serialize;

use super::ScoringError;
use crate::models::Match;

/// Where a match sits on the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    Ongoing,
    Upcoming,
    Past,
}

/// Matches partitioned by state. Each bucket keeps schedule order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchBuckets {
    pub ongoing: Vec<Match>,
    pub upcoming: Vec<Match>,
    pub past: Vec<Match>,
}

impl MatchBuckets {
    pub fn len(&self) -> usize {
        self.ongoing.len() + self.upcoming.len() + self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reject clock values no bucket rule can be evaluated against.
fn check_times(m: &Match) -> Result<(), ScoringError> {
    if !m.elapsed_time.is_finite() {
        return Err(ScoringError::InvalidMatchTime {
            match_id: m.id.clone(),
            field: "elapsedTime",
        });
    }
    if !m.match_time.is_finite() {
        return Err(ScoringError::InvalidMatchTime {
            match_id: m.id.clone(),
            field: "matchTime",
        });
    }
    Ok(())
}

/// State of a single match.
///
/// Open matches are ongoing once the clock has run, upcoming before that.
/// A closed match is past whether or not a winner was declared, so every
/// well-formed match lands in exactly one bucket.
pub fn match_state(m: &Match) -> Result<MatchState, ScoringError> {
    check_times(m)?;

    let state = match (m.has_ended(), m.elapsed_time > 0.0) {
        (false, true) => MatchState::Ongoing,
        (false, false) => MatchState::Upcoming,
        (true, _) => MatchState::Past,
    };
    Ok(state)
}

/// Partition a schedule into ongoing, upcoming and past matches.
pub fn classify(matches: &[Match]) -> Result<MatchBuckets, ScoringError> {
    let mut buckets = MatchBuckets::default();

    for m in matches {
        let bucket = match match_state(m)? {
            MatchState::Ongoing => &mut buckets.ongoing,
            MatchState::Upcoming => &mut buckets.upcoming,
            MatchState::Past => &mut buckets.past,
        };
        bucket.push(m.clone());
    }

    Ok(buckets)
}
