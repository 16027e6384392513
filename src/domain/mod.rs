// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// One subdirectory per bounded context, each with:
// - Value objects
// - Requests (REST input)
// - Errors
// - Aggregate
// - Repository (Postgres + in-memory)
// - Service (load, validate, mutate, persist, notify)
//
// Services only talk to other services through the notifications exchange.
//
// ============================================================================

pub mod fleet;
pub mod pedido;
