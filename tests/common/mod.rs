#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use logiflow::db::RepositoryError;
use logiflow::domain::fleet::{
    CreateRepartidorRequest, CreateVehiculoRequest, EstadoRepartidor, InMemoryRepartidorRepository,
    InMemoryVehiculoRepository, Repartidor, RepartidorRepository, RepartidorService, TipoVehiculo, Vehiculo,
    VehiculoRepository, VehiculoService,
};
use logiflow::domain::pedido::{
    CreatePedidoRequest, InMemoryPedidoRepository, Pedido, PedidoFilter, PedidoRepository, PedidoService,
    TipoEntrega,
};
use logiflow::metrics::Metrics;
use logiflow::notifications::{InMemoryPublisher, Microservice, NotificationProducer};

pub struct PedidoHarness {
    pub service: PedidoService,
    pub repository: Arc<InMemoryPedidoRepository>,
    pub publisher: Arc<InMemoryPublisher>,
    pub metrics: Arc<Metrics>,
}

pub fn pedido_harness() -> PedidoHarness {
    let repository = Arc::new(InMemoryPedidoRepository::new());
    let publisher = Arc::new(InMemoryPublisher::new());
    let metrics = Arc::new(Metrics::new().unwrap());
    let producer = NotificationProducer::new(Microservice::Pedido, publisher.clone(), metrics.clone());

    PedidoHarness {
        service: PedidoService::new(repository.clone(), producer),
        repository,
        publisher,
        metrics,
    }
}

pub struct FleetHarness {
    pub repartidores: RepartidorService,
    pub vehiculos: VehiculoService,
    pub publisher: Arc<InMemoryPublisher>,
    pub metrics: Arc<Metrics>,
}

pub fn fleet_harness() -> FleetHarness {
    let repartidores = Arc::new(InMemoryRepartidorRepository::new());
    let vehiculos = Arc::new(InMemoryVehiculoRepository::new());
    let publisher = Arc::new(InMemoryPublisher::new());
    let metrics = Arc::new(Metrics::new().unwrap());
    let producer = NotificationProducer::new(Microservice::Fleet, publisher.clone(), metrics.clone());

    FleetHarness {
        repartidores: RepartidorService::new(repartidores, vehiculos.clone(), producer.clone()),
        vehiculos: VehiculoService::new(vehiculos, producer),
        publisher,
        metrics,
    }
}

// ============================================================================
// Failing Repositories
// ============================================================================
//
// Wrap the in-memory stores and let a test make the next writes fail the way
// Postgres would: a unique violation lost to a concurrent writer, or a dead
// pool. Reads always go through.
//
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum WriteFailure {
    Conflict(&'static str),
    PoolTimedOut,
}

impl WriteFailure {
    fn error(self) -> RepositoryError {
        match self {
            WriteFailure::Conflict(constraint) => RepositoryError::Conflict(constraint.to_string()),
            WriteFailure::PoolTimedOut => RepositoryError::Database(sqlx::Error::PoolTimedOut),
        }
    }
}

pub struct FailingWrites {
    armed: AtomicBool,
    failure: std::sync::Mutex<WriteFailure>,
}

impl FailingWrites {
    fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            failure: std::sync::Mutex::new(WriteFailure::PoolTimedOut),
        }
    }

    pub fn fail_with(&self, failure: WriteFailure) {
        *self.failure.lock().unwrap() = failure;
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn recover(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.armed.load(Ordering::SeqCst) {
            return Err(self.failure.lock().unwrap().error());
        }
        Ok(())
    }
}

pub struct FlakyPedidoRepository {
    pub inner: InMemoryPedidoRepository,
    pub writes: FailingWrites,
}

#[async_trait]
impl PedidoRepository for FlakyPedidoRepository {
    async fn insert(&self, pedido: &Pedido) -> Result<Pedido, RepositoryError> {
        self.writes.check()?;
        self.inner.insert(pedido).await
    }

    async fn update(&self, pedido: &Pedido) -> Result<Pedido, RepositoryError> {
        self.writes.check()?;
        self.inner.update(pedido).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Pedido>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_numero(&self, numero_pedido: &str) -> Result<Option<Pedido>, RepositoryError> {
        self.inner.find_by_numero(numero_pedido).await
    }

    async fn exists_by_numero(&self, numero_pedido: &str) -> Result<bool, RepositoryError> {
        self.inner.exists_by_numero(numero_pedido).await
    }

    async fn find_active(&self, filter: &PedidoFilter) -> Result<Vec<Pedido>, RepositoryError> {
        self.inner.find_active(filter).await
    }
}

/// Courier store whose existence checks miss a concurrent insert, so the
/// duplicate is only caught by the unique constraint on write.
pub struct RacingRepartidorRepository {
    pub inner: InMemoryRepartidorRepository,
    pub writes: FailingWrites,
}

#[async_trait]
impl RepartidorRepository for RacingRepartidorRepository {
    async fn insert(&self, repartidor: &Repartidor) -> Result<Repartidor, RepositoryError> {
        self.writes.check()?;
        self.inner.insert(repartidor).await
    }

    async fn update(&self, repartidor: &Repartidor) -> Result<Repartidor, RepositoryError> {
        self.writes.check()?;
        self.inner.update(repartidor).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Repartidor>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_codigo(&self, codigo_empleado: &str) -> Result<Option<Repartidor>, RepositoryError> {
        self.inner.find_by_codigo(codigo_empleado).await
    }

    async fn exists_by_codigo(&self, _codigo_empleado: &str) -> Result<bool, RepositoryError> {
        Ok(false)
    }

    async fn exists_by_cedula(&self, _cedula: &str) -> Result<bool, RepositoryError> {
        Ok(false)
    }

    async fn exists_by_email(&self, _email: &str) -> Result<bool, RepositoryError> {
        Ok(false)
    }

    async fn find_active(&self, estado: Option<EstadoRepartidor>) -> Result<Vec<Repartidor>, RepositoryError> {
        self.inner.find_active(estado).await
    }
}

pub struct FlakyVehiculoRepository {
    pub inner: InMemoryVehiculoRepository,
    pub writes: FailingWrites,
}

#[async_trait]
impl VehiculoRepository for FlakyVehiculoRepository {
    async fn insert(&self, vehiculo: &Vehiculo) -> Result<Vehiculo, RepositoryError> {
        self.writes.check()?;
        self.inner.insert(vehiculo).await
    }

    async fn update(&self, vehiculo: &Vehiculo) -> Result<Vehiculo, RepositoryError> {
        self.writes.check()?;
        self.inner.update(vehiculo).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehiculo>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn exists_by_placa(&self, placa: &str) -> Result<bool, RepositoryError> {
        self.inner.exists_by_placa(placa).await
    }

    async fn find_active(&self) -> Result<Vec<Vehiculo>, RepositoryError> {
        self.inner.find_active().await
    }
}

pub struct FlakyPedidoHarness {
    pub service: PedidoService,
    pub repository: Arc<FlakyPedidoRepository>,
    pub publisher: Arc<InMemoryPublisher>,
}

pub fn flaky_pedido_harness() -> FlakyPedidoHarness {
    let repository = Arc::new(FlakyPedidoRepository {
        inner: InMemoryPedidoRepository::new(),
        writes: FailingWrites::new(),
    });
    let publisher = Arc::new(InMemoryPublisher::new());
    let metrics = Arc::new(Metrics::new().unwrap());
    let producer = NotificationProducer::new(Microservice::Pedido, publisher.clone(), metrics);

    FlakyPedidoHarness {
        service: PedidoService::new(repository.clone(), producer),
        repository,
        publisher,
    }
}

pub struct RacingFleetHarness {
    pub repartidores: RepartidorService,
    pub vehiculos: VehiculoService,
    pub repartidor_store: Arc<RacingRepartidorRepository>,
    pub vehiculo_store: Arc<FlakyVehiculoRepository>,
    pub publisher: Arc<InMemoryPublisher>,
}

pub fn racing_fleet_harness() -> RacingFleetHarness {
    let repartidor_store = Arc::new(RacingRepartidorRepository {
        inner: InMemoryRepartidorRepository::new(),
        writes: FailingWrites::new(),
    });
    let vehiculo_store = Arc::new(FlakyVehiculoRepository {
        inner: InMemoryVehiculoRepository::new(),
        writes: FailingWrites::new(),
    });
    let publisher = Arc::new(InMemoryPublisher::new());
    let metrics = Arc::new(Metrics::new().unwrap());
    let producer = NotificationProducer::new(Microservice::Fleet, publisher.clone(), metrics);

    RacingFleetHarness {
        repartidores: RepartidorService::new(repartidor_store.clone(), vehiculo_store.clone(), producer.clone()),
        vehiculos: VehiculoService::new(vehiculo_store.clone(), producer),
        repartidor_store,
        vehiculo_store,
        publisher,
    }
}

/// Quito centre to Quito north, well inside the urban radius.
pub fn pedido_urbano() -> CreatePedidoRequest {
    CreatePedidoRequest {
        cliente_id: Uuid::new_v4(),
        cliente_nombre: "María López".to_string(),
        tipo_entrega: TipoEntrega::UrbanaRapida,
        prioridad: None,
        direccion_origen: "Av. Amazonas N34-45, Quito".to_string(),
        latitud_origen: Some(-0.1807),
        longitud_origen: Some(-78.4678),
        direccion_destino: "Av. 6 de Diciembre N50, Quito".to_string(),
        latitud_destino: Some(-0.1062),
        longitud_destino: Some(-78.4879),
        zona_id: "170150".to_string(),
        descripcion_paquete: "Documentos".to_string(),
        peso_kg: None,
        dimensiones: None,
        fecha_estimada_entrega: None,
        observaciones: None,
    }
}

/// Quito to Ambato, roughly 120 km.
pub fn pedido_intermunicipal() -> CreatePedidoRequest {
    CreatePedidoRequest {
        tipo_entrega: TipoEntrega::Intermunicipal,
        direccion_destino: "Av. Cevallos, Ambato".to_string(),
        latitud_destino: Some(-1.2491),
        longitud_destino: Some(-78.6168),
        zona_id: "180101".to_string(),
        ..pedido_urbano()
    }
}

pub fn repartidor(codigo: &str) -> CreateRepartidorRequest {
    CreateRepartidorRequest {
        codigo_empleado: codigo.to_string(),
        nombre_completo: format!("Repartidor {}", codigo),
        cedula: format!("17{}", codigo.replace('-', "")),
        email: format!("{}@logiflow.ec", codigo.to_lowercase()),
        telefono: Some("0991234567".to_string()),
        direccion: None,
        fecha_nacimiento: None,
        fecha_contratacion: None,
        licencias_conducir: Some("B".to_string()),
        numero_licencia: None,
        fecha_vencimiento_licencia: None,
        vehiculo_id: None,
        observaciones: None,
    }
}

pub fn vehiculo(placa: &str) -> CreateVehiculoRequest {
    CreateVehiculoRequest {
        placa: placa.to_string(),
        marca: "Honda".to_string(),
        modelo: "CB190".to_string(),
        anio: Some(2022),
        tipo: TipoVehiculo::Motocicleta,
        capacidad_kg: None,
        estado: None,
    }
}
