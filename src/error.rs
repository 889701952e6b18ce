use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::registry::RegistryError;

/// Errors surfaced to HTTP callers
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("Shortcode already taken")]
    CodeCollision(String),
    #[error("Shortcode not found")]
    NotFound(String),
    #[error("Link expired")]
    Expired(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::CodeCollision(_) => StatusCode::CONFLICT,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Expired(_) => StatusCode::GONE,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::EmptyUrl => ServiceError::Validation(err.to_string()),
            RegistryError::InvalidValidity(_) => ServiceError::Validation(err.to_string()),
            RegistryError::CodeTaken(code) => ServiceError::CodeCollision(code),
            RegistryError::CodeSpaceExhausted(_) => ServiceError::Internal(err.into()),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match &self {
            ServiceError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_errors_map_to_http_taxonomy() {
        let cases = [
            (RegistryError::EmptyUrl, StatusCode::BAD_REQUEST),
            (RegistryError::InvalidValidity(-1), StatusCode::BAD_REQUEST),
            (RegistryError::CodeTaken("abc".into()), StatusCode::CONFLICT),
            (RegistryError::CodeSpaceExhausted(10), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ServiceError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_response_status() {
        let response = ServiceError::Expired("abc".into()).into_response();
        assert_eq!(response.status(), StatusCode::GONE);

        let response = ServiceError::NotFound("abc".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
