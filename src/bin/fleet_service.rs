use actix_web::{web, App, HttpServer};
use std::sync::Arc;

use logiflow::config::{Config, ServiceKind};
use logiflow::db::{self, schema};
use logiflow::domain::fleet::{
    InMemoryRepartidorRepository, InMemoryVehiculoRepository, PgRepartidorRepository, PgVehiculoRepository,
    RepartidorRepository, RepartidorService, VehiculoRepository, VehiculoService,
};
use logiflow::metrics::{self, Metrics, ServiceName};
use logiflow::notifications::{AmqpPublisher, Microservice, NotificationProducer};
use logiflow::{http, telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env(ServiceKind::Fleet)?;
    telemetry::init(config.logging.format);

    tracing::info!("🚀 Starting LogiFlow fleet-service");

    // === 1. Metrics ===
    let metrics = Arc::new(Metrics::new()?);

    // === 2. Notifications (lazy AMQP link, best-effort) ===
    let publisher = Arc::new(AmqpPublisher::new(config.broker.amqp_settings()));
    publisher.warm_up().await;
    let producer = NotificationProducer::new(Microservice::Fleet, publisher.clone(), metrics.clone());

    // === 3. Persistence ===
    let (repartidores, vehiculos): (Arc<dyn RepartidorRepository>, Arc<dyn VehiculoRepository>) =
        match &config.database {
            Some(database) => {
                let pool = db::connect(database).await?;
                schema::bootstrap(&pool, schema::FLEET_SCHEMA).await?;
                (
                    Arc::new(PgRepartidorRepository::new(pool.clone())),
                    Arc::new(PgVehiculoRepository::new(pool)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set, fleet data is kept in memory and lost on restart");
                (
                    Arc::new(InMemoryRepartidorRepository::new()),
                    Arc::new(InMemoryVehiculoRepository::new()),
                )
            }
        };

    let repartidor_service = RepartidorService::new(repartidores, vehiculos.clone(), producer.clone());
    let vehiculo_service = VehiculoService::new(vehiculos, producer);

    // === 4. HTTP ===
    let bind = (config.server.host.clone(), config.server.port);
    tracing::info!(host = %bind.0, port = bind.1, "🌐 Listening");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(repartidor_service.clone()))
            .app_data(web::Data::new(vehiculo_service.clone()))
            .app_data(web::Data::new(metrics.clone()))
            .app_data(web::Data::new(ServiceName(ServiceKind::Fleet.name())))
            .configure(http::extractor_config)
            .configure(metrics::configure)
            .configure(http::fleet::configure)
    })
    .bind(bind)?
    .run()
    .await?;

    publisher.close().await;
    tracing::info!("fleet-service stopped");
    Ok(())
}
