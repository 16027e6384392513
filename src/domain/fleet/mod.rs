// ============================================================================
// Fleet Domain - couriers and vehicles for fleet-service
// ============================================================================
//
// - Value objects (EstadoRepartidor, TipoVehiculo, EstadoVehiculo)
// - Requests (CreateRepartidorRequest, CreateVehiculoRequest, ...)
// - Errors (FleetError)
// - Aggregates (Repartidor, Vehiculo)
// - Repositories (Postgres + in-memory for each aggregate)
// - Services (RepartidorService, VehiculoService)
//
// ============================================================================

pub mod aggregate;
pub mod commands;
pub mod errors;
pub mod repository;
pub mod service;
pub mod value_objects;

pub use aggregate::*;
pub use commands::*;
pub use errors::*;
pub use repository::*;
pub use service::*;
pub use value_objects::*;
