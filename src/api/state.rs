use std::sync::Arc;

use crate::feed::SnapshotHub;
use crate::models::ScoringRules;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<SnapshotHub>,
    pub rules: ScoringRules,
}
