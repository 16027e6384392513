use crate::db::RepositoryError;

// ============================================================================
// Pedido Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PedidoError {
    #[error("{0}")]
    Validation(String),

    #[error("Pedido no encontrado: {0}")]
    NotFound(String),

    #[error("{0}")]
    IllegalState(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PedidoError {
    pub fn validation(message: impl Into<String>) -> Self {
        PedidoError::Validation(message.into())
    }

    pub fn not_found(key: impl std::fmt::Display) -> Self {
        PedidoError::NotFound(key.to_string())
    }
}
