//! Domain-change notifications published to the shared RabbitMQ exchange.

pub mod breaker;
pub mod builder;
pub mod event;
pub mod memory;
pub mod producer;
pub mod publisher;
pub mod topology;

pub use breaker::{BreakerConfig, BreakerState, BrokerBreaker};
pub use builder::{merge_data, EventBuilder};
pub use event::{Action, DataValue, EntityType, EventData, Microservice, NotificationEvent, Severity};
pub use crate::vocabulary::VocabularyError;
pub use memory::InMemoryPublisher;
pub use producer::{NotificationProducer, PublishOutcome};
pub use publisher::{AmqpPublisher, AmqpSettings, NotificationPublisher, PublishError};
