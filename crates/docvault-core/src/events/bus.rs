//! In-process event fan-out.

use tokio::sync::broadcast;
use tracing::trace;

use super::DomainEvent;

/// Broadcast bus for [`DomainEvent`]s.
///
/// Publishing never blocks and never fails: with no subscribers the event
/// is dropped, and a subscriber that falls more than `capacity` events
/// behind observes `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: DomainEvent) {
        match self.tx.send(event) {
            Ok(receivers) => trace!(receivers, "Published domain event"),
            Err(_) => trace!("Domain event dropped, no subscribers"),
        }
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{DocumentEvent, EventPayload};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let document_id = Uuid::new_v4();

        bus.publish(DomainEvent::document(
            None,
            DocumentEvent::VersionsPruned {
                document_id,
                deleted_count: 2,
                bytes_freed: 10,
            },
        ));

        let event = rx.recv().await.unwrap();
        match event.payload {
            EventPayload::Document(DocumentEvent::VersionsPruned { document_id: id, .. }) => {
                assert_eq!(id, document_id)
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new(1);
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(DomainEvent::document(
            None,
            DocumentEvent::VersionsPruned {
                document_id: Uuid::new_v4(),
                deleted_count: 0,
                bytes_freed: 0,
            },
        ));
    }

    #[test]
    fn test_event_serializes_with_domain_tag() {
        let event = DomainEvent::document(
            None,
            DocumentEvent::VersionsPruned {
                document_id: Uuid::nil(),
                deleted_count: 1,
                bytes_freed: 3,
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["payload"]["domain"], "Document");
        assert_eq!(json["payload"]["event"]["type"], "VersionsPruned");
    }
}
