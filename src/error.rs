// HTTP API Error Types
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::services::ServiceError;

const INTERNAL_MESSAGE: &str = "An error occurred while processing your request";

/// HTTP API error with status code, stable error code and client-safe message
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    MissingField(String),

    // 401 Unauthorized
    Unauthenticated(String),
    InvalidCredential(String),

    // 403 Forbidden
    InsufficientRole(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    InvalidState(String),
    Conflict(String),

    // 422 Unprocessable Entity
    OutOfRange(String),

    // 500 Internal Server Error
    Internal(String),

    // 503 Service Unavailable
    StorageUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::MissingField(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) | ApiError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            ApiError::InsufficientRole(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidState(_) | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::OutOfRange(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client-safe message. Internal details stay in the logs.
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::MissingField(msg)
            | ApiError::Unauthenticated(msg)
            | ApiError::InvalidCredential(msg)
            | ApiError::InsufficientRole(msg)
            | ApiError::NotFound(msg)
            | ApiError::InvalidState(msg)
            | ApiError::Conflict(msg)
            | ApiError::OutOfRange(msg) => msg,
            ApiError::Internal(_) => INTERNAL_MESSAGE,
            ApiError::StorageUnavailable(_) => "Storage temporarily unavailable",
        }
    }

    /// Error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::MissingField(_) => "MISSING_FIELD",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::InvalidCredential(_) => "INVALID_CREDENTIAL",
            ApiError::InsufficientRole(_) => "INSUFFICIENT_ROLE",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidState(_) => "INVALID_STATE",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::OutOfRange(_) => "OUT_OF_RANGE",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
            ApiError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        })
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated(msg) => ApiError::Unauthenticated(msg.to_string()),
            AuthError::InvalidCredential(_) => ApiError::InvalidCredential(err.to_string()),
            AuthError::InsufficientRole { .. } => ApiError::InsufficientRole(err.to_string()),
            AuthError::TokenGeneration(msg) => {
                tracing::error!("Token generation failed: {}", msg);
                ApiError::Internal(msg)
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::MissingField(_) => ApiError::MissingField(err.to_string()),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::InvalidState(msg) => ApiError::InvalidState(msg),
            ServiceError::OutOfRange(msg) => ApiError::OutOfRange(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::StorageUnavailable(msg) => ApiError::StorageUnavailable(msg),
            ServiceError::Auth(auth) => auth.into(),
            ServiceError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if let ApiError::Internal(detail) | ApiError::StorageUnavailable(detail) = &self {
            tracing::error!("{}: {}", self.error_code(), detail);
        }
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
