// ============================================================================
// Pedido Domain - order lifecycle for pedido-service
// ============================================================================
//
// - Value objects (EstadoPedido, PrioridadPedido, TipoEntrega, Coordenadas)
// - Requests (CreatePedidoRequest, UpdatePedidoRequest, ...)
// - Errors (PedidoError)
// - Aggregate (Pedido with coverage and state rules)
// - Repository (PgPedidoRepository, InMemoryPedidoRepository)
// - Service (PedidoService)
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
