//! # Dojo Scoreboard
//!
//! Live scoring engine for round-robin martial arts tournaments.
//!
//! ## Architecture
//!
//! - **models**: Snapshot data (tournaments, matches, users) and standings records
//! - **calculate**: Match classification, standings aggregation and winner detection
//! - **feed**: Snapshot sources, the live snapshot hub and the derived scoreboard view
//! - **storage**: JSON / JSONL snapshot files
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod feed;
pub mod models;
pub mod storage;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "6h", "30m", "90s").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    Some(Duration::from_secs(num * multiplier))
}
