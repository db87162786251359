//! Player notifications derived from farm events.
//!
//! The relay subscribes to the broadcast sink and turns the events a player
//! should hear about into notices. Victims learn who stole from them;
//! thieves learn about traps and cooldowns. An online recipient gets the
//! notice at once as a structured log line for the host to forward; an
//! offline one finds it queued in the store on their next join.

use std::sync::Arc;

use stealfarm_core::clock::Clock;
use stealfarm_core::presence::Presence;
use stealfarm_db::{DbError, FarmStore};
use stealfarm_types::{FarmEvent, PendingNotice, PlayerId};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A message addressed to one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Who should see it.
    pub recipient: PlayerId,
    /// Short human-readable text.
    pub message: String,
}

/// The notice for `event`, if a player should be told about it.
pub fn notice_for(event: &FarmEvent) -> Option<Notice> {
    let (recipient, message) = match event {
        FarmEvent::PlotAllocated { owner_id, plot } => (
            *owner_id,
            format!("your farm is ready at grid ({}, {})", plot.grid_x, plot.grid_z),
        ),
        FarmEvent::CropStolen {
            thief_id,
            victim_id,
            crop_type,
            amount,
        } => (
            *victim_id,
            format!("{thief_id} stole {amount} {crop_type} from your farm"),
        ),
        FarmEvent::TrapTriggered {
            thief_id,
            victim_id,
            trap_type,
            ..
        } => (
            *thief_id,
            format!("you triggered a {trap_type} trap on the farm of {victim_id}"),
        ),
        FarmEvent::StealCooldownStarted {
            thief_id,
            victim_id,
            cooldown_end,
        } => (
            *thief_id,
            format!("you can steal from {victim_id} again at {cooldown_end}"),
        ),
        FarmEvent::CropWatered {
            waterer_id,
            owner_id,
            new_stage,
            ..
        } => (
            *owner_id,
            format!("{waterer_id} watered your crop, now at stage {new_stage}"),
        ),
        _ => return None,
    };
    Some(Notice { recipient, message })
}

/// How a notice reached its recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The recipient was online.
    Live,
    /// Kept in the store until the recipient joins.
    Queued,
}

/// Routes notices to online players or the offline queue.
pub struct Relay {
    store: Arc<dyn FarmStore>,
    clock: Arc<dyn Clock>,
    presence: Arc<Presence>,
}

impl Relay {
    /// Build a relay over the shared store, clock and presence set.
    pub fn new(store: Arc<dyn FarmStore>, clock: Arc<dyn Clock>, presence: Arc<Presence>) -> Self {
        Self {
            store,
            clock,
            presence,
        }
    }

    /// Hand one notice to its recipient, or queue it if they are away.
    pub async fn deliver(&self, notice: Notice) -> Result<Delivery, DbError> {
        if self.presence.is_online(notice.recipient) {
            info!(
                recipient = %notice.recipient,
                message = %notice.message,
                "Player notified"
            );
            return Ok(Delivery::Live);
        }
        self.store
            .queue_notice(&PendingNotice {
                recipient: notice.recipient,
                message: notice.message,
                created_at: self.clock.now_ms(),
            })
            .await?;
        debug!(recipient = %notice.recipient, "Notice queued for offline player");
        Ok(Delivery::Queued)
    }

    /// Run until every publisher is gone.
    ///
    /// Returns the number of notices delivered or queued. A receiver that
    /// falls behind skips the missed events with a warning; a notice that
    /// cannot be queued is dropped with a warning.
    pub fn spawn(self, mut rx: Receiver<FarmEvent>) -> JoinHandle<u64> {
        tokio::spawn(async move {
            let mut handled = 0_u64;
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let Some(notice) = notice_for(&event) else {
                            continue;
                        };
                        let recipient = notice.recipient;
                        match self.deliver(notice).await {
                            Ok(_) => handled = handled.saturating_add(1),
                            Err(e) => {
                                warn!(recipient = %recipient, error = %e, "Notice dropped");
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Notification relay lagged, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            handled
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stealfarm_core::clock::ManualClock;
    use stealfarm_core::events::{BroadcastSink, EventSink};
    use stealfarm_db::MemoryStore;
    use stealfarm_types::CropId;

    use super::*;

    fn stolen(thief: PlayerId, victim: PlayerId) -> FarmEvent {
        FarmEvent::CropStolen {
            thief_id: thief,
            victim_id: victim,
            crop_type: "wheat".into(),
            amount: 2,
        }
    }

    fn relay(store: &Arc<MemoryStore>, presence: &Arc<Presence>) -> Relay {
        Relay::new(
            Arc::clone(store) as Arc<dyn FarmStore>,
            Arc::new(ManualClock::new(500)),
            Arc::clone(presence),
        )
    }

    #[test]
    fn theft_notifies_the_victim() {
        let (thief, victim) = (PlayerId::new(), PlayerId::new());
        let notice = notice_for(&stolen(thief, victim)).unwrap();
        assert_eq!(notice.recipient, victim);
        assert!(notice.message.contains("2 wheat"));
    }

    #[test]
    fn bookkeeping_events_are_silent() {
        let event = FarmEvent::EnemyMarked {
            victim_id: PlayerId::new(),
            thief_id: PlayerId::new(),
        };
        assert!(notice_for(&event).is_none());
        let watered = FarmEvent::CropWatered {
            waterer_id: PlayerId::new(),
            owner_id: PlayerId::new(),
            crop_id: CropId::new(),
            new_stage: 1,
        };
        assert!(notice_for(&watered).is_some());
    }

    #[tokio::test]
    async fn offline_victims_find_the_notice_queued() {
        let store = Arc::new(MemoryStore::new());
        let presence = Arc::new(Presence::new());
        let relay = relay(&store, &presence);
        let (thief, victim) = (PlayerId::new(), PlayerId::new());

        let notice = notice_for(&stolen(thief, victim)).unwrap();
        assert_eq!(relay.deliver(notice.clone()).await.unwrap(), Delivery::Queued);
        let queued = store.take_notices(victim).await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued.first().unwrap().message, notice.message);
        assert_eq!(queued.first().unwrap().created_at, 500);

        presence.join(victim);
        assert_eq!(relay.deliver(notice).await.unwrap(), Delivery::Live);
        assert!(store.take_notices(victim).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn relay_counts_notices_until_closed() {
        let store = Arc::new(MemoryStore::new());
        let presence = Arc::new(Presence::new());
        let sink = BroadcastSink::new();
        let handle = relay(&store, &presence).spawn(sink.subscribe());
        let (thief, victim) = (PlayerId::new(), PlayerId::new());
        presence.join(victim);

        sink.publish(stolen(thief, victim));
        sink.publish(FarmEvent::EnemyMarked {
            victim_id: victim,
            thief_id: thief,
        });
        sink.publish(stolen(thief, victim));
        drop(sink);

        assert_eq!(handle.await.unwrap(), 2);
        assert!(store.take_notices(victim).await.unwrap().is_empty());
    }
}
