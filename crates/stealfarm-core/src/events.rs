//! Event sinks for [`FarmEvent`]s.
//!
//! Services publish through an injected [`EventSink`] and never learn who
//! consumes the events. Achievements, notifications, leaderboards and the
//! terrain renderer subscribe independently.

use std::sync::{Arc, Mutex};

use stealfarm_types::FarmEvent;
use tokio::sync::broadcast;
use tracing::info;

/// Capacity of the broadcast channel for farm events.
///
/// A subscriber that falls behind by more than this many events receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest event.
const BROADCAST_CAPACITY: usize = 1024;

/// Destination for domain events.
pub trait EventSink: Send + Sync {
    /// Hand one event to the sink. Must not block.
    fn publish(&self, event: FarmEvent);
}

/// Writes every event as one structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: FarmEvent) {
        let payload = serde_json::to_string(&event).unwrap_or_default();
        info!(event = event.name(), %payload, "Farm event");
    }
}

/// Fans events out to any number of async subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<FarmEvent>,
}

impl BroadcastSink {
    /// Create a sink with no subscribers.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<FarmEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for BroadcastSink {
    fn publish(&self, event: FarmEvent) {
        // No subscribers is not an error.
        let _ = self.tx.send(event);
    }
}

/// Keeps every event in memory, in publish order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<FarmEvent>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything published so far.
    pub fn events(&self) -> Vec<FarmEvent> {
        let Ok(events) = self.events.lock() else {
            return Vec::new();
        };
        events.clone()
    }

    /// Names of everything published so far.
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(FarmEvent::name).collect()
    }

    /// Drop everything recorded.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: FarmEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Forwards each event to several sinks in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    /// Create a fan-out over `sinks`.
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl std::fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventSink for FanoutSink {
    fn publish(&self, event: FarmEvent) {
        for sink in &self.sinks {
            sink.publish(event.clone());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stealfarm_types::PlayerId;

    use super::*;

    fn marked() -> FarmEvent {
        FarmEvent::EnemyMarked {
            victim_id: PlayerId::new(),
            thief_id: PlayerId::new(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber() {
        let sink = BroadcastSink::new();
        let mut a = sink.subscribe();
        let mut b = sink.subscribe();
        let event = marked();
        sink.publish(event.clone());
        assert_eq!(a.recv().await.unwrap(), event);
        assert_eq!(b.recv().await.unwrap(), event);
    }

    #[test]
    fn broadcast_without_subscribers_is_silent() {
        BroadcastSink::new().publish(marked());
    }

    #[test]
    fn fanout_forwards_in_order() {
        let first = Arc::new(RecordingSink::new());
        let second = Arc::new(RecordingSink::new());
        let fanout = FanoutSink::new(vec![first.clone(), second.clone(), Arc::new(TracingSink)]);
        fanout.publish(marked());
        fanout.publish(marked());
        assert_eq!(first.events().len(), 2);
        assert_eq!(second.names(), vec!["enemy_marked", "enemy_marked"]);
        first.clear();
        assert!(first.events().is_empty());
    }
}
