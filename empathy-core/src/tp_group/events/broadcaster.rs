//! Event Broadcasting System
//!
//! Fans group events out to every interested view (chat window, contact
//! list, call handler).

use crate::metrics::record_counter;
use crate::tp_group::events::GroupEvent;
use tokio::sync::broadcast;

/// Event broadcaster for group events
///
/// Uses a tokio broadcast channel, so every subscriber sees every event in
/// emission order. Subscribers that fall more than `capacity` events behind
/// observe a lag error on their receiver.
#[derive(Clone)]
pub struct GroupEventBroadcaster {
    tx: broadcast::Sender<GroupEvent>,
}

impl GroupEventBroadcaster {
    /// Create a new event broadcaster
    ///
    /// # Arguments
    /// * `capacity` - Channel capacity (number of events buffered)
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers
    ///
    /// # Returns
    /// Number of active subscribers that received the event
    pub fn emit(&self, event: GroupEvent) -> usize {
        record_counter("group.events.emitted", 1);
        self.tx.send(event).unwrap_or(0)
    }

    /// Emit multiple events in order
    pub fn emit_many(&self, events: Vec<GroupEvent>) {
        for event in events {
            let _ = self.emit(event);
        }
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<GroupEvent> {
        self.tx.subscribe()
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for GroupEventBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tp_group::types::{ChangeReason, Contact, Handle};

    fn added(handle: u32) -> GroupEvent {
        GroupEvent::MemberAdded {
            contact: Contact::new(Handle(handle), format!("contact{}", handle)),
            actor: None,
            reason: ChangeReason::None,
            message: None,
        }
    }

    #[tokio::test]
    async fn test_broadcaster_creation() {
        let broadcaster = GroupEventBroadcaster::new(10);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let broadcaster = GroupEventBroadcaster::new(10);
        let mut rx1 = broadcaster.subscribe();
        let mut rx2 = broadcaster.subscribe();

        assert_eq!(broadcaster.emit(added(1)), 2);

        assert_eq!(rx1.recv().await.unwrap(), added(1));
        assert_eq!(rx2.recv().await.unwrap(), added(1));
    }

    #[tokio::test]
    async fn test_emit_many_preserves_order() {
        let broadcaster = GroupEventBroadcaster::new(10);
        let mut rx = broadcaster.subscribe();

        broadcaster.emit_many(vec![added(1), GroupEvent::Ready, added(2)]);

        assert_eq!(rx.recv().await.unwrap(), added(1));
        assert_eq!(rx.recv().await.unwrap(), GroupEvent::Ready);
        assert_eq!(rx.recv().await.unwrap(), added(2));
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let broadcaster = GroupEventBroadcaster::new(10);
        assert_eq!(broadcaster.emit(GroupEvent::Destroyed), 0);
    }
}
