use actix_web::{web, App, HttpServer};
use std::sync::Arc;

use logiflow::config::{Config, ServiceKind};
use logiflow::db::{self, schema};
use logiflow::domain::pedido::{InMemoryPedidoRepository, PedidoRepository, PedidoService, PgPedidoRepository};
use logiflow::metrics::{self, Metrics, ServiceName};
use logiflow::notifications::{AmqpPublisher, Microservice, NotificationProducer};
use logiflow::{http, telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env(ServiceKind::Pedido)?;
    telemetry::init(config.logging.format);

    tracing::info!("🚀 Starting LogiFlow pedido-service");

    // === 1. Metrics ===
    let metrics = Arc::new(Metrics::new()?);

    // === 2. Notifications (lazy AMQP link, best-effort) ===
    let publisher = Arc::new(AmqpPublisher::new(config.broker.amqp_settings()));
    publisher.warm_up().await;
    let producer = NotificationProducer::new(Microservice::Pedido, publisher.clone(), metrics.clone());

    // === 3. Persistence ===
    let repository: Arc<dyn PedidoRepository> = match &config.database {
        Some(database) => {
            let pool = db::connect(database).await?;
            schema::bootstrap(&pool, schema::PEDIDO_SCHEMA).await?;
            Arc::new(PgPedidoRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory and lost on restart");
            Arc::new(InMemoryPedidoRepository::new())
        }
    };

    let service = PedidoService::new(repository, producer);

    // === 4. HTTP ===
    let bind = (config.server.host.clone(), config.server.port);
    tracing::info!(host = %bind.0, port = bind.1, "🌐 Listening");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(service.clone()))
            .app_data(web::Data::new(metrics.clone()))
            .app_data(web::Data::new(ServiceName(ServiceKind::Pedido.name())))
            .configure(http::extractor_config)
            .configure(metrics::configure)
            .configure(http::pedido::configure)
    })
    .bind(bind)?
    .run()
    .await?;

    publisher.close().await;
    tracing::info!("pedido-service stopped");
    Ok(())
}
