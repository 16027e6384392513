use async_trait::async_trait;
use lapin::options::BasicPublishOptions;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::Mutex;

use super::breaker::{BreakerConfig, BreakerState, BrokerBreaker};
use super::event::NotificationEvent;
use super::topology::{self, NOTIFICATIONS_EXCHANGE, NOTIFICATIONS_ROUTING_KEY};

const PERSISTENT_DELIVERY: u8 = 2;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Broker transport error: {0}")]
    Transport(String),

    #[error("Publish timed out after {0:?}")]
    Timeout(Duration),

    #[error("Broker circuit breaker is open")]
    CircuitOpen,
}

impl PublishError {
    pub fn transport(err: impl Display) -> Self {
        PublishError::Transport(err.to_string())
    }

    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            PublishError::Serialization(_) => "serialization",
            PublishError::Transport(_) => "transport",
            PublishError::Timeout(_) => "timeout",
            PublishError::CircuitOpen => "circuit_open",
        }
    }
}

/// Delivers one envelope to the notifications exchange.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn send(&self, event: &NotificationEvent) -> Result<(), PublishError>;

    async fn breaker_state(&self) -> Option<BreakerState> {
        None
    }
}

// ============================================================================
// AMQP Publisher
// ============================================================================

#[derive(Debug, Clone)]
pub struct AmqpSettings {
    pub uri: String,
    /// host:port/vhost, safe to log
    pub endpoint: String,
    pub publish_timeout: Duration,
    pub breaker: BreakerConfig,
}

struct Link {
    connection: Connection,
    channel: Channel,
}

impl Link {
    async fn open(settings: &AmqpSettings) -> Result<Self, PublishError> {
        let connection = Connection::connect(&settings.uri, ConnectionProperties::default())
            .await
            .map_err(PublishError::transport)?;
        let channel = connection
            .create_channel()
            .await
            .map_err(PublishError::transport)?;

        topology::declare(&channel)
            .await
            .map_err(PublishError::transport)?;

        tracing::info!(endpoint = %settings.endpoint, "Connected to RabbitMQ");
        Ok(Self { connection, channel })
    }
}

/// Holds the open link tagged with the generation it was opened under, so a
/// failed publish only tears down the link it actually used.
struct LinkSlot<L> {
    current: Option<(u64, L)>,
    opened: u64,
}

impl<L> LinkSlot<L> {
    fn empty() -> Self {
        Self {
            current: None,
            opened: 0,
        }
    }

    fn get(&self) -> Option<(u64, &L)> {
        self.current.as_ref().map(|(generation, link)| (*generation, link))
    }

    fn replace(&mut self, link: L) -> u64 {
        self.opened += 1;
        self.current = Some((self.opened, link));
        self.opened
    }

    fn take(&mut self) -> Option<L> {
        self.current.take().map(|(_, link)| link)
    }

    /// Drops the link only if it is still the one opened as `generation`.
    fn discard(&mut self, generation: u64) -> Option<L> {
        match self.current {
            Some((current, _)) if current == generation => self.take(),
            _ => None,
        }
    }
}

pub struct AmqpPublisher {
    settings: AmqpSettings,
    link: Mutex<LinkSlot<Link>>,
    breaker: BrokerBreaker,
}

impl AmqpPublisher {
    pub fn new(settings: AmqpSettings) -> Self {
        let breaker = BrokerBreaker::new(settings.breaker.clone());
        Self {
            settings,
            link: Mutex::new(LinkSlot::empty()),
            breaker,
        }
    }

    /// Opens the link eagerly. Failure is logged only; the next publish tries again.
    pub async fn warm_up(&self) {
        if let Err(e) = self.channel().await {
            tracing::warn!(
                endpoint = %self.settings.endpoint,
                error = %e,
                "RabbitMQ unreachable at startup, notifications will be dropped until it recovers"
            );
        }
    }

    pub async fn close(&self) {
        let Some(link) = self.link.lock().await.take() else {
            return;
        };

        if let Err(e) = link.channel.close(200, "shutdown").await {
            tracing::warn!(error = %e, "Error closing RabbitMQ channel");
        }
        if let Err(e) = link.connection.close(200, "shutdown").await {
            tracing::warn!(error = %e, "Error closing RabbitMQ connection");
        }
        tracing::info!("RabbitMQ connection closed");
    }

    async fn channel(&self) -> Result<(Channel, u64), PublishError> {
        let mut slot = self.link.lock().await;

        if let Some((generation, current)) = slot.get() {
            if current.channel.status().connected() {
                return Ok((current.channel.clone(), generation));
            }
            tracing::warn!(endpoint = %self.settings.endpoint, "RabbitMQ channel lost, reopening");
        }

        let fresh = Link::open(&self.settings).await?;
        let channel = fresh.channel.clone();
        let generation = slot.replace(fresh);
        Ok((channel, generation))
    }

    async fn deliver(&self, payload: &[u8]) -> Result<(), PublishError> {
        let (channel, generation) = self.channel().await?;

        let properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_content_encoding("UTF-8".into())
            .with_delivery_mode(PERSISTENT_DELIVERY);

        let sent = async {
            channel
                .basic_publish(
                    NOTIFICATIONS_EXCHANGE,
                    NOTIFICATIONS_ROUTING_KEY,
                    BasicPublishOptions::default(),
                    payload,
                    properties,
                )
                .await?
                .await
        }
        .await;

        if let Err(e) = sent {
            self.link.lock().await.discard(generation);
            return Err(PublishError::transport(e));
        }

        Ok(())
    }
}

#[async_trait]
impl NotificationPublisher for AmqpPublisher {
    async fn send(&self, event: &NotificationEvent) -> Result<(), PublishError> {
        let payload = event.to_json()?;
        let timeout = self.settings.publish_timeout;

        self.breaker
            .call(async {
                tokio::time::timeout(timeout, self.deliver(&payload))
                    .await
                    .map_err(|_| PublishError::Timeout(timeout))?
            })
            .await
    }

    async fn breaker_state(&self) -> Option<BreakerState> {
        Some(self.breaker.state().await)
    }
}
