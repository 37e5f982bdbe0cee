use crate::errors::Error;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

/// JSON body of every error and acknowledgement: `{"message": "..."}`.
#[derive(Debug, Serialize)]
pub struct Message {
    /// Human-readable text
    pub message: String,
}

impl Message {
    /// Wraps `message`.
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Errors returned by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// No `Authorization` header
    MissingAuthorization,
    /// The presented key does not grant access to this resource
    Forbidden,
    /// Malformed request outside of the core validation (e.g. multipart fields)
    BadRequest(String),
    /// Error from the core
    Core(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Core(err)
    }
}

/// Handler result type
pub type ApiResult<T> = std::result::Result<T, ApiError>;

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation { .. } => StatusCode::BAD_REQUEST,
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        e if e.is_conflict() || matches!(e, Error::StatusInUse { .. }) => StatusCode::CONFLICT,
        e if e.is_external() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingAuthorization => (
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Invalid API key".to_string()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Core(err) => {
                let status = status_for(&err);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    // Details stay in the log
                    error!("Internal error: {}", err);
                    (status, "Internal server error".to_string())
                } else {
                    (status, err.to_string())
                }
            }
        };
        (status, Message::new(message)).into_response()
    }
}
