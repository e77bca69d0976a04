use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, AccountError>;

#[derive(Debug, Error)]
pub enum AccountError {
    /// Required fields are missing or empty.
    #[error("{0}")]
    Validation(String),
    /// The body does not have the expected shape.
    #[error("{0}")]
    DataValidation(String),
    #[error("Account with id [{0}] could not be found.")]
    NotFound(String),
    #[error("The requested URL was not found on the server.")]
    RouteNotFound,
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("The method is not allowed for the requested URL.")]
    MethodNotAllowed,
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AccountError {
    pub fn status(&self) -> StatusCode {
        match self {
            AccountError::Validation(_) | AccountError::DataValidation(_) => {
                StatusCode::BAD_REQUEST
            }
            AccountError::NotFound(_) | AccountError::RouteNotFound => StatusCode::NOT_FOUND,
            AccountError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AccountError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AccountError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AccountError::Storage(e) => {
                error!(error = %e, "storage failure");
                "Internal server error".to_string()
            }
            other => {
                warn!(%status, error = %other, "request rejected");
                other.to_string()
            }
        };
        let body = ErrorBody {
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error"),
            message,
        };
        (status, Json(body)).into_response()
    }
}
