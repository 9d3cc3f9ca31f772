//! Error types for the Tundra system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TundraError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("One-time code has expired")]
    Expired,

    #[error("Operation failed: {reason}")]
    OperationFailed { reason: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type TundraResult<T> = Result<T, TundraError>;

/// Stable tag for each error variant, used by the boundary layer to
/// pick a status code without matching on payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidCredential,
    Expired,
    OperationFailed,
    Forbidden,
    Validation,
    Storage,
}

impl TundraError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::InvalidCredential => ErrorKind::InvalidCredential,
            Self::Expired => ErrorKind::Expired,
            Self::OperationFailed { .. } => ErrorKind::OperationFailed,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Database(_) | Self::Crypto(_) | Self::Internal(_) => ErrorKind::Storage,
        }
    }
}
