use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Blank input: {0}")]
    BlankInput(String),

    #[error("Provider connectivity error: {0}")]
    Connectivity(String),

    #[error("Provider format error: {0}")]
    Format(String),

    #[error("Provider structure error: {0}")]
    Structure(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Transport and payload failures count as a failed attempt and may be retried.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            AppError::Connectivity(_) | AppError::Format(_) | AppError::Structure(_)
        )
    }
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Configuration(ref e) => {
                tracing::error!("Configuration error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Service misconfigured")
            }
            AppError::BlankInput(ref e) => (StatusCode::BAD_REQUEST, e.as_str()),
            AppError::InvalidRequest(ref e) => (StatusCode::BAD_REQUEST, e.as_str()),
            AppError::Connectivity(ref e) => {
                tracing::error!("Routing provider unreachable: {}", e);
                (StatusCode::BAD_GATEWAY, "Routing service unreachable")
            }
            AppError::Format(ref e) | AppError::Structure(ref e) => {
                tracing::warn!("Routing provider returned an unusable response: {}", e);
                (StatusCode::BAD_GATEWAY, "Routing service error")
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
