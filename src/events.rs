//! In-process publish/subscribe for draft changes.
//!
//! Draft stores publish a [`StudioEvent`] after every list change. Registered
//! [`EventHandler`]s are awaited inline, in registration order, so a publish
//! returns only once every dependent view has been rebuilt. Passive listeners
//! (CLI output, tests) can also `subscribe()` to a broadcast channel.
//!
//! Handlers are held weakly: a handler that also owns a store publishing to
//! this bus would otherwise keep itself alive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::ItemKind;

const CHANNEL_CAPACITY: usize = 64;

/// A draft list changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudioEvent {
    pub kind: ItemKind,
    /// Operation that triggered the change, e.g. `DraftStore.create`.
    pub caller: String,
}

impl StudioEvent {
    pub fn draft_updated(kind: ItemKind, caller: impl Into<String>) -> Self {
        Self {
            kind,
            caller: caller.into(),
        }
    }

    /// Wire name: `draft:document:updated` or `draft:media:updated`.
    pub fn name(&self) -> String {
        format!("draft:{}:updated", self.kind.label())
    }
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &StudioEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Registration {
    id: SubscriptionId,
    handler: Weak<dyn EventHandler>,
}

pub struct EventBus {
    handlers: RwLock<Vec<Registration>>,
    sender: broadcast::Sender<StudioEvent>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            handlers: RwLock::new(Vec::new()),
            sender,
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a handler invoked on every publish.
    pub fn register(&self, handler: &Arc<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push(Registration {
            id,
            handler: Arc::downgrade(handler),
        });
        id
    }

    pub fn unregister(&self, id: SubscriptionId) {
        self.handlers.write().retain(|r| r.id != id);
    }

    /// Drop every registered handler.
    pub fn clear(&self) {
        self.handlers.write().clear();
    }

    pub fn handler_count(&self) -> usize {
        self.handlers
            .read()
            .iter()
            .filter(|r| r.handler.strong_count() > 0)
            .count()
    }

    /// Passive receiver of every published event.
    pub fn subscribe(&self) -> broadcast::Receiver<StudioEvent> {
        self.sender.subscribe()
    }

    /// Deliver `event` to every live handler, then to subscribers.
    pub async fn publish(&self, event: StudioEvent) {
        tracing::debug!(
            "[events] {} called by {}",
            event.name(),
            event.caller
        );

        // lock is released before any handler runs
        let live: Vec<Arc<dyn EventHandler>> = {
            let mut handlers = self.handlers.write();
            handlers.retain(|r| r.handler.strong_count() > 0);
            handlers.iter().filter_map(|r| r.handler.upgrade()).collect()
        };

        for handler in live {
            handler.handle(&event).await;
        }

        // no receivers is not an error
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: &StudioEvent) {
            self.seen
                .lock()
                .push(format!("{}:{}", event.name(), event.caller));
        }
    }

    #[test]
    fn test_event_names() {
        assert_eq!(
            StudioEvent::draft_updated(ItemKind::Document, "x").name(),
            "draft:document:updated"
        );
        assert_eq!(
            StudioEvent::draft_updated(ItemKind::Media, "x").name(),
            "draft:media:updated"
        );
    }

    #[tokio::test]
    async fn test_publish_reaches_handlers_inline() {
        let bus = EventBus::new();
        let recorder = Arc::new(Recorder::default());
        let handler: Arc<dyn EventHandler> = recorder.clone();
        bus.register(&handler);

        bus.publish(StudioEvent::draft_updated(ItemKind::Document, "DraftStore.create"))
            .await;

        assert_eq!(
            *recorder.seen.lock(),
            vec!["draft:document:updated:DraftStore.create".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unregister_and_dropped_handlers() {
        let bus = EventBus::new();
        let recorder = Arc::new(Recorder::default());
        let handler: Arc<dyn EventHandler> = recorder.clone();
        let id = bus.register(&handler);

        let transient: Arc<dyn EventHandler> = Arc::new(Recorder::default());
        bus.register(&transient);
        assert_eq!(bus.handler_count(), 2);

        drop(transient);
        assert_eq!(bus.handler_count(), 1);

        bus.unregister(id);
        bus.publish(StudioEvent::draft_updated(ItemKind::Media, "test"))
            .await;
        assert!(recorder.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_receives_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(StudioEvent::draft_updated(ItemKind::Media, "DraftStore.load"))
            .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, ItemKind::Media);
        assert_eq!(event.caller, "DraftStore.load");
    }
}
