use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::ids::IdError;
use super::repository::RepositoryError;

/// Error taxonomy shared by every fund service.
///
/// Validation and state errors are raised before any write, so a returned
/// error implies no partial mutation.
#[derive(Debug, thiserror::Error)]
pub enum FundError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("operation not valid in the current state: {0}")]
    InvalidState(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("identifier sequence corrupt: {0}")]
    Identifier(#[from] IdError),
    #[error("storage unavailable: {0}")]
    Storage(String),
}

impl FundError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl From<RepositoryError> for FundError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict => Self::Conflict("record already exists".to_string()),
            RepositoryError::NotFound => Self::NotFound {
                entity: "record",
                id: String::new(),
            },
            RepositoryError::Unavailable(reason) => Self::Storage(reason),
        }
    }
}

impl IntoResponse for FundError {
    fn into_response(self) -> Response {
        let status = match &self {
            FundError::NotFound { .. } => StatusCode::NOT_FOUND,
            FundError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FundError::Forbidden(_) => StatusCode::FORBIDDEN,
            FundError::InvalidState(_) => StatusCode::CONFLICT,
            FundError::Conflict(_) => StatusCode::CONFLICT,
            FundError::Identifier(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FundError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
