//! Per-tournament fan-out of live snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use super::TransportError;
use crate::models::{Tournament, TournamentId};

/// A published snapshot with its per-tournament revision. Revisions start
/// at 1 and increase by one per publish.
#[derive(Debug, Clone)]
pub struct SnapshotUpdate {
    pub revision: u64,
    pub tournament: Arc<Tournament>,
}

/// Latest snapshot per tournament plus a broadcast channel per subscribed
/// tournament.
pub struct SnapshotHub {
    latest: RwLock<HashMap<TournamentId, SnapshotUpdate>>,
    channels: RwLock<HashMap<TournamentId, broadcast::Sender<SnapshotUpdate>>>,
    capacity: usize,
}

impl Default for SnapshotHub {
    fn default() -> Self {
        Self::new(16)
    }
}

impl SnapshotHub {
    /// `capacity` is the number of updates a slow subscriber may fall
    /// behind before it starts skipping to newer ones.
    pub fn new(capacity: usize) -> Self {
        Self {
            latest: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Store `tournament` as the latest snapshot and notify subscribers.
    pub async fn publish(&self, tournament: Tournament) -> u64 {
        let id = tournament.id.clone();
        let update = {
            let mut latest = self.latest.write().await;
            let revision = latest.get(&id).map_or(1, |u| u.revision + 1);
            let update = SnapshotUpdate {
                revision,
                tournament: Arc::new(tournament),
            };
            latest.insert(id.clone(), update.clone());
            update
        };

        let revision = update.revision;
        if let Some(sender) = self.channels.read().await.get(&id) {
            if sender.send(update).is_err() {
                debug!(tournament = %id, "No live subscribers");
            }
        }
        revision
    }

    /// Publish only if the snapshot differs from the latest one.
    pub async fn publish_if_changed(&self, tournament: Tournament) -> Option<u64> {
        let unchanged = self
            .latest
            .read()
            .await
            .get(&tournament.id)
            .is_some_and(|u| *u.tournament == tournament);

        if unchanged {
            None
        } else {
            Some(self.publish(tournament).await)
        }
    }

    pub async fn latest(&self, id: &TournamentId) -> Option<SnapshotUpdate> {
        self.latest.read().await.get(id).cloned()
    }

    /// Latest snapshot of every known tournament.
    pub async fn all(&self) -> Vec<SnapshotUpdate> {
        self.latest.read().await.values().cloned().collect()
    }

    /// Start receiving updates for `id`. The current snapshot, if any, is
    /// handed over with the subscription so the caller can render at once.
    pub async fn subscribe(&self, id: &TournamentId) -> Subscription {
        let receiver = {
            let mut channels = self.channels.write().await;
            channels
                .entry(id.clone())
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .subscribe()
        };

        debug!(tournament = %id, "Subscribed");
        Subscription {
            tournament_id: id.clone(),
            current: self.latest(id).await,
            receiver,
        }
    }

    /// Close the channel for `id`. Existing subscriptions end after draining.
    pub async fn unsubscribe(&self, id: &TournamentId) -> bool {
        let removed = self.channels.write().await.remove(id).is_some();
        if removed {
            info!(tournament = %id, "Unsubscribed");
        }
        removed
    }

    pub async fn subscriber_count(&self, id: &TournamentId) -> usize {
        self.channels
            .read()
            .await
            .get(id)
            .map_or(0, |s| s.receiver_count())
    }
}

/// Live updates for one tournament. Dropping it detaches from the channel.
pub struct Subscription {
    tournament_id: TournamentId,
    current: Option<SnapshotUpdate>,
    receiver: broadcast::Receiver<SnapshotUpdate>,
}

impl Subscription {
    pub fn tournament_id(&self) -> &TournamentId {
        &self.tournament_id
    }

    /// Snapshot that was current when the subscription was made.
    pub fn take_current(&mut self) -> Option<SnapshotUpdate> {
        self.current.take()
    }

    /// Wait for the next update. Lagging subscribers skip ahead; every
    /// snapshot is complete so nothing is lost by doing so.
    pub async fn recv(&mut self) -> Result<SnapshotUpdate, TransportError> {
        loop {
            match self.receiver.recv().await {
                Ok(update) => return Ok(update),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        tournament = %self.tournament_id,
                        skipped,
                        "Subscriber lagged, skipping to newer snapshots"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(TransportError::ChannelClosed(self.tournament_id.clone()));
                }
            }
        }
    }
}
