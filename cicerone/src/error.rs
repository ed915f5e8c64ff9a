//! Service error type and its HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cicerone_sparql::SparqlError;
use serde_json::json;
use tracing::{debug, error};

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by the manifest service
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A library-level failure: query execution, registry loading, caching
    #[error(transparent)]
    Sparql(#[from] SparqlError),

    /// Service configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ServiceError {
    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Sparql(SparqlError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServiceError::Sparql(SparqlError::QueryError(_)) => StatusCode::BAD_GATEWAY,
            ServiceError::Sparql(SparqlError::ConnectionError(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::NOT_FOUND {
            debug!("{}", self);
        } else {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
