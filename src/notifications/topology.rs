use lapin::options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Channel, ExchangeKind};

// Shared with every consumer of the notifications queue. Do not rename.
pub const NOTIFICATIONS_EXCHANGE: &str = "notifications_exchange";
pub const NOTIFICATIONS_QUEUE: &str = "notifications_queue";
pub const NOTIFICATIONS_ROUTING_KEY: &str = "notifications_routingKey";

pub fn exchange_kind() -> ExchangeKind {
    ExchangeKind::Topic
}

pub fn exchange_options() -> ExchangeDeclareOptions {
    ExchangeDeclareOptions {
        durable: true,
        auto_delete: false,
        ..ExchangeDeclareOptions::default()
    }
}

pub fn queue_options() -> QueueDeclareOptions {
    QueueDeclareOptions {
        durable: true,
        ..QueueDeclareOptions::default()
    }
}

/// Declares exchange, queue and binding. Idempotent on the broker side.
pub async fn declare(channel: &Channel) -> Result<(), lapin::Error> {
    channel
        .exchange_declare(
            NOTIFICATIONS_EXCHANGE,
            exchange_kind(),
            exchange_options(),
            FieldTable::default(),
        )
        .await?;

    channel
        .queue_declare(NOTIFICATIONS_QUEUE, queue_options(), FieldTable::default())
        .await?;

    channel
        .queue_bind(
            NOTIFICATIONS_QUEUE,
            NOTIFICATIONS_EXCHANGE,
            NOTIFICATIONS_ROUTING_KEY,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await?;

    tracing::info!(
        exchange = NOTIFICATIONS_EXCHANGE,
        queue = NOTIFICATIONS_QUEUE,
        routing_key = NOTIFICATIONS_ROUTING_KEY,
        "Notification topology declared"
    );

    Ok(())
}
