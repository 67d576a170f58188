use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::Envelope;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the HTTP handlers, rendered as `{code: -1, msg}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(ServiceError),
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => Self::InvalidRequest(msg),
            ServiceError::NotFound(msg) => Self::NotFound(msg),
            other => Self::Internal(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = match self {
            Self::InvalidRequest(msg) | Self::NotFound(msg) => msg,
            Self::Internal(e) => {
                error!(error = %e, "request failed");
                "internal server error".to_string()
            }
        };
        (status, Json(Envelope::failure(msg))).into_response()
    }
}
