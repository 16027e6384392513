use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::metrics::Metrics;

use super::builder::EventBuilder;
use super::event::{EntityType, EventData, Microservice, NotificationEvent};
use super::publisher::{NotificationPublisher, PublishError};

/// What happened to one publish attempt. Callers may ignore it; it is already
/// logged and counted.
#[derive(Debug)]
pub enum PublishOutcome {
    Delivered { event_id: Uuid },
    Dropped { event_id: Uuid, error: PublishError },
}

impl PublishOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, PublishOutcome::Delivered { .. })
    }

    pub fn event_id(&self) -> Uuid {
        match self {
            PublishOutcome::Delivered { event_id } | PublishOutcome::Dropped { event_id, .. } => *event_id,
        }
    }
}

// ============================================================================
// Notification Producer
// ============================================================================
//
// Best-effort, fire-and-forget: one attempt per event, failures are logged,
// counted and returned as a value. Nothing here ever fails the business
// operation that triggered the event.
//
// ============================================================================

#[derive(Clone)]
pub struct NotificationProducer {
    builder: EventBuilder,
    publisher: Arc<dyn NotificationPublisher>,
    metrics: Arc<Metrics>,
}

impl NotificationProducer {
    pub fn new(
        microservice: Microservice,
        publisher: Arc<dyn NotificationPublisher>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            builder: EventBuilder::new(microservice),
            publisher,
            metrics,
        }
    }

    pub fn builder(&self) -> &EventBuilder {
        &self.builder
    }

    pub async fn publish_event(&self, event: &NotificationEvent) -> PublishOutcome {
        let started = Instant::now();
        let result = self.publisher.send(event).await;
        let elapsed = started.elapsed().as_secs_f64();

        let microservice = event.microservice().as_str();
        let entity_type = event.entity_type().as_str();
        let action = event.action().as_str();

        let outcome = match result {
            Ok(()) => {
                tracing::info!(
                    event_id = %event.event_id(),
                    action,
                    entity_type,
                    entity_id = %event.entity_id(),
                    "Notification published"
                );
                self.metrics.record_published(microservice, entity_type, action, elapsed);
                PublishOutcome::Delivered { event_id: event.event_id() }
            }
            Err(error) => {
                tracing::error!(
                    event_id = %event.event_id(),
                    action,
                    entity_type,
                    entity_id = %event.entity_id(),
                    error = %error,
                    "Failed to publish notification, event dropped"
                );
                self.metrics
                    .record_dropped(microservice, entity_type, action, error.reason(), elapsed);
                PublishOutcome::Dropped {
                    event_id: event.event_id(),
                    error,
                }
            }
        };

        if let Some(state) = self.publisher.breaker_state().await {
            self.metrics.update_breaker_state(state.as_gauge());
        }

        outcome
    }

    pub async fn publish_created(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
        additional: Option<EventData>,
    ) -> PublishOutcome {
        let event = self.builder.created(entity_type, entity_id, additional);
        self.publish_event(&event).await
    }

    pub async fn publish_state_changed(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
        estado_anterior: &str,
        estado_nuevo: &str,
        additional: Option<EventData>,
    ) -> PublishOutcome {
        let event = self
            .builder
            .state_changed(entity_type, entity_id, estado_anterior, estado_nuevo, additional);
        self.publish_event(&event).await
    }

    pub async fn publish_assigned(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
        pedido_id: Uuid,
        additional: Option<EventData>,
    ) -> PublishOutcome {
        let event = self.builder.assigned(entity_type, entity_id, pedido_id, additional);
        self.publish_event(&event).await
    }

    pub async fn publish_cancelled(&self, entity_type: EntityType, entity_id: Uuid, motivo: &str) -> PublishOutcome {
        let event = self.builder.cancelled(entity_type, entity_id, motivo);
        self.publish_event(&event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{Action, InMemoryPublisher};

    fn producer(publisher: Arc<InMemoryPublisher>) -> (NotificationProducer, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new().unwrap());
        (
            NotificationProducer::new(Microservice::Pedido, publisher, metrics.clone()),
            metrics,
        )
    }

    #[tokio::test]
    async fn test_delivered_event_is_counted() {
        let publisher = Arc::new(InMemoryPublisher::new());
        let (producer, metrics) = producer(publisher.clone());

        let outcome = producer.publish_created(EntityType::Pedido, Uuid::new_v4(), None).await;

        assert!(outcome.is_delivered());
        assert_eq!(publisher.len(), 1);
        assert_eq!(publisher.events()[0].event_id(), outcome.event_id());
        assert_eq!(metrics.published_count("pedido-service", "PEDIDO", "CREATED"), 1);
    }

    #[tokio::test]
    async fn test_outage_is_swallowed_and_counted() {
        let publisher = Arc::new(InMemoryPublisher::offline());
        let (producer, metrics) = producer(publisher.clone());

        let outcome = producer
            .publish_state_changed(EntityType::Pedido, Uuid::new_v4(), "RECIBIDO", "EN_RUTA", None)
            .await;

        match outcome {
            PublishOutcome::Dropped { error, .. } => assert_eq!(error.reason(), "transport"),
            other => panic!("expected a dropped event, got {:?}", other),
        }
        assert!(publisher.is_empty());
        assert_eq!(metrics.dropped_count("pedido-service", "PEDIDO", "UPDATED", "transport"), 1);
    }

    #[tokio::test]
    async fn test_cancelled_goes_through_same_path() {
        let publisher = Arc::new(InMemoryPublisher::new());
        let (producer, _) = producer(publisher.clone());

        producer.publish_cancelled(EntityType::Pedido, Uuid::new_v4(), "dirección errónea").await;

        assert_eq!(publisher.events_for(EntityType::Pedido, Action::Cancelled).len(), 1);
    }
}
