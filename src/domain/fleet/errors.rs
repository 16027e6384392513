use crate::db::RepositoryError;

// ============================================================================
// Fleet Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} no encontrado: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{0}")]
    IllegalState(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl FleetError {
    pub fn validation(message: impl Into<String>) -> Self {
        FleetError::Validation(message.into())
    }

    pub fn repartidor_not_found(key: impl std::fmt::Display) -> Self {
        FleetError::NotFound {
            entity: "Repartidor",
            key: key.to_string(),
        }
    }

    pub fn vehiculo_not_found(key: impl std::fmt::Display) -> Self {
        FleetError::NotFound {
            entity: "Vehículo",
            key: key.to_string(),
        }
    }
}
