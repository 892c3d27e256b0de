use thiserror::Error;

use crate::auth::AuthError;
use crate::database::DatabaseError;

/// Failures of inventory and account operations, one variant per kind the
/// caller can distinguish.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    OutOfRange(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        if err.is_unavailable() {
            return ServiceError::StorageUnavailable(err.to_string());
        }
        match err {
            DatabaseError::NotFound { .. } => ServiceError::NotFound(capitalize(&err.to_string())),
            DatabaseError::InvalidState(msg) => ServiceError::InvalidState(msg),
            DatabaseError::OutOfRange(msg) => ServiceError::OutOfRange(msg),
            DatabaseError::Conflict(msg) => ServiceError::Conflict(msg),
            DatabaseError::Unavailable(msg) => ServiceError::StorageUnavailable(msg),
            DatabaseError::ConfigMissing(_) | DatabaseError::Sqlx(_) => ServiceError::Internal(err.to_string()),
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
