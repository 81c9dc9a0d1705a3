//! Snapshot delivery.
//!
//! Snapshots reach the scoring engine through two paths: an initial fetch
//! from a [`SnapshotSource`] and live pushes fanned out by the
//! [`SnapshotHub`]. Every delivery is a full tournament; the
//! [`ScoreboardView`] recomputes from scratch on each one.

mod http;
mod hub;
mod view;

pub use http::*;
pub use hub::*;
pub use view::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Tournament, TournamentId};

/// Failures fetching or receiving snapshots. Surfaced to the caller as-is;
/// retrying is the caller's decision.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Subscription to {0} was closed")]
    ChannelClosed(TournamentId),
}

impl TransportError {
    /// Whether trying again later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            TransportError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            TransportError::InvalidUrl(_)
            | TransportError::NotFound(_)
            | TransportError::ChannelClosed(_) => false,
        }
    }
}

/// Where tournament snapshots come from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Source identifier for logging.
    fn name(&self) -> &'static str;

    /// Fetch one tournament by id.
    async fn fetch(&self, id: &TournamentId) -> Result<Tournament, TransportError>;

    /// Fetch every tournament the source knows about.
    async fn list(&self) -> Result<Vec<Tournament>, TransportError>;
}

/// Fetch `id` once and publish it if it differs from the latest snapshot.
/// Returns the new revision, or `None` when nothing changed.
pub async fn poll_once(
    source: &dyn SnapshotSource,
    hub: &SnapshotHub,
    id: &TournamentId,
) -> Result<Option<u64>, TransportError> {
    let snapshot = source.fetch(id).await?;
    let revision = hub.publish_if_changed(snapshot).await;
    match revision {
        Some(rev) => debug!(tournament = %id, revision = rev, "Published snapshot"),
        None => debug!(tournament = %id, "Snapshot unchanged"),
    }
    Ok(revision)
}

/// Poll `id` every `interval` until the task is aborted.
pub async fn run_poller(
    source: Arc<dyn SnapshotSource>,
    hub: Arc<SnapshotHub>,
    id: TournamentId,
    interval: Duration,
) {
    info!(
        source = source.name(),
        tournament = %id,
        "Polling every {:?}",
        interval
    );
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = poll_once(source.as_ref(), &hub, &id).await {
            warn!(
                tournament = %id,
                retryable = e.is_retryable(),
                "Snapshot fetch failed: {}",
                e
            );
        }
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockSource;
    use super::*;
    use crate::models::fixtures::*;

    #[test]
    fn test_retryable_statuses() {
        let server_error = TransportError::HttpStatus {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        let client_error = TransportError::HttpStatus {
            status: 404,
            message: "Not Found".to_string(),
        };

        assert!(server_error.is_retryable());
        assert!(!client_error.is_retryable());
        assert!(!TransportError::ChannelClosed("t1".into()).is_retryable());
    }

    #[tokio::test]
    async fn test_poll_once_publishes_only_changes() {
        let a = user("1", "Alice", "Aoki");
        let t = tournament(vec![a.clone()], vec![]);
        let source = MockSource::new(vec![t.clone()]);
        let hub = SnapshotHub::default();

        assert_eq!(poll_once(&source, &hub, &t.id).await.unwrap(), Some(1));
        assert_eq!(poll_once(&source, &hub, &t.id).await.unwrap(), None);

        let mut changed = t.clone();
        changed.players.push(user("2", "Bob", "Baba"));
        source.replace(changed);
        assert_eq!(poll_once(&source, &hub, &t.id).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_poll_once_surfaces_fetch_errors() {
        let source = MockSource::new(vec![]);
        let hub = SnapshotHub::default();

        let err = poll_once(&source, &hub, &"missing".into()).await.unwrap_err();
        assert!(matches!(err, TransportError::NotFound(_)));
        assert!(hub.latest(&"missing".into()).await.is_none());
    }
}
