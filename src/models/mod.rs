//! Core data models for tournament snapshots and derived standings.

mod game_match;
mod ids;
mod standings;
mod tournament;
mod user;

pub use game_match::*;
pub use ids::*;
pub use standings::*;
pub use tournament::*;
pub use user::*;

#[cfg(test)]
pub(crate) use tournament::fixtures;
