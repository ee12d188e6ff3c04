//! Refresh notification bus backed by a tokio broadcast channel

use licwatch_host_api::RefreshNotifier;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// "Refresh now" message delivered to every subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Increases by one per broadcast; gaps mean a lagging receiver dropped some
    pub sequence: u64,
}

/// [`RefreshNotifier`] that fans out to any number of subscribers.
///
/// Broadcasting with no subscribers is not an error.
#[derive(Debug)]
pub struct BroadcastRefreshBus {
    tx: broadcast::Sender<RefreshRequest>,
    sequence: AtomicU64,
}

impl BroadcastRefreshBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshRequest> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastRefreshBus {
    fn default() -> Self {
        Self::new(16)
    }
}

impl RefreshNotifier for BroadcastRefreshBus {
    fn broadcast_refresh(&self) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let receivers = self.tx.send(RefreshRequest { sequence }).unwrap_or(0);
        debug!(sequence, receivers, "Refresh broadcast");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_receives_refresh() {
        let bus = BroadcastRefreshBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.broadcast_refresh();
        bus.broadcast_refresh();

        assert_eq!(rx1.recv().await.unwrap().sequence, 1);
        assert_eq!(rx1.recv().await.unwrap().sequence, 2);
        assert_eq!(rx2.recv().await.unwrap().sequence, 1);
    }

    #[test]
    fn broadcast_without_subscribers_is_harmless() {
        let bus = BroadcastRefreshBus::new(0);
        bus.broadcast_refresh();
        bus.broadcast_refresh();
    }
}
