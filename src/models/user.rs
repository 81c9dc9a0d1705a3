//! User model for players, officials and tournament creators.

use serde::{Deserialize, Serialize};

use super::UserId;

/// A registered user as embedded in tournament snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn new(id: impl Into<UserId>, first_name: &str, last_name: &str) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }

    /// "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Name for display. When the roster has colliding names the id suffix
    /// is appended so the entries can be told apart.
    pub fn display_name(&self, same_names: bool) -> String {
        display_name(self.full_name(), &self.id, same_names)
    }

    /// Case-insensitive full name comparison, Unicode aware.
    pub fn has_same_name(&self, other: &User) -> bool {
        self.first_name.to_lowercase() == other.first_name.to_lowercase()
            && self.last_name.to_lowercase() == other.last_name.to_lowercase()
    }
}

/// `full_name`, with the id suffix appended when names collide.
pub(super) fn display_name(full_name: String, id: &UserId, same_names: bool) -> String {
    if same_names {
        format!("{} ({})", full_name, id.suffix())
    } else {
        full_name
    }
}
