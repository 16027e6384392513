use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::event::{Action, EntityType, NotificationEvent};
use super::publisher::{NotificationPublisher, PublishError};

/// Publisher that keeps delivered events in memory. Can be switched offline
/// to behave like an unreachable broker.
#[derive(Default)]
pub struct InMemoryPublisher {
    events: Mutex<Vec<NotificationEvent>>,
    offline: AtomicBool,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        let publisher = Self::default();
        publisher.set_offline(true);
        publisher
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    pub fn events_for(&self, entity_type: EntityType, action: Action) -> Vec<NotificationEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.entity_type() == entity_type && e.action() == action)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

#[async_trait]
impl NotificationPublisher for InMemoryPublisher {
    async fn send(&self, event: &NotificationEvent) -> Result<(), PublishError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PublishError::transport("broker offline"));
        }

        // Same serialization path as the broker so wire failures surface here too.
        let bytes = event.to_json()?;
        let decoded = NotificationEvent::from_json(&bytes)?;

        self.events
            .lock()
            .map_err(|_| PublishError::transport("event log poisoned"))?
            .push(decoded);
        Ok(())
    }
}
