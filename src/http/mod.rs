//! REST surface of both services.
//!
//! Domain errors become `{"error": "...", "code": "..."}` bodies:
//! validation 400, not found 404, illegal state or uniqueness race 409,
//! anything else from the store 500.

pub mod fleet;
pub mod pedido;

use actix_web::http::StatusCode;
use actix_web::{error, web, HttpRequest, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

use crate::db::RepositoryError;
use crate::domain::fleet::FleetError;
use crate::domain::pedido::PedidoError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
        }
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
        RepositoryError::Corrupt(_) | RepositoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_body(status: StatusCode, message: String) -> HttpResponse {
    let code = match status {
        StatusCode::BAD_REQUEST => "VALIDATION_ERROR",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::CONFLICT => "CONFLICT",
        _ => "INTERNAL_ERROR",
    };

    let message = if status.is_server_error() {
        tracing::error!(error = %message, "Request failed");
        "Error interno del servidor".to_string()
    } else {
        message
    };

    HttpResponse::build(status).json(ErrorResponse::new(message, code))
}

impl ResponseError for PedidoError {
    fn status_code(&self) -> StatusCode {
        match self {
            PedidoError::Validation(_) => StatusCode::BAD_REQUEST,
            PedidoError::NotFound(_) => StatusCode::NOT_FOUND,
            PedidoError::IllegalState(_) => StatusCode::CONFLICT,
            PedidoError::Repository(err) => repository_status(err),
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), self.to_string())
    }
}

impl ResponseError for FleetError {
    fn status_code(&self) -> StatusCode {
        match self {
            FleetError::Validation(_) => StatusCode::BAD_REQUEST,
            FleetError::NotFound { .. } => StatusCode::NOT_FOUND,
            FleetError::IllegalState(_) => StatusCode::CONFLICT,
            FleetError::Repository(err) => repository_status(err),
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), self.to_string())
    }
}

/// Malformed bodies, paths and queries are validation errors with the same
/// body shape as domain errors.
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        bad_request(err.to_string())
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req: &HttpRequest| {
        bad_request(err.to_string())
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        bad_request(err.to_string())
    }));
}

fn bad_request(message: String) -> actix_web::Error {
    error::InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(ErrorResponse::new(message, "VALIDATION_ERROR")),
    )
    .into()
}
