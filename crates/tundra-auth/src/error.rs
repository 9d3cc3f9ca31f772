//! Credential gate error types.

use thiserror::Error;
use tundra_core::error::TundraError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("no one-time code is pending")]
    CodeNotPending,

    #[error("one-time code has expired")]
    CodeExpired,

    #[error("password policy: {0}")]
    Policy(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for TundraError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => TundraError::InvalidCredential,
            AuthError::CodeNotPending => TundraError::NotFound {
                entity: "one_time_code".into(),
                id: "pending".into(),
            },
            AuthError::CodeExpired => TundraError::Expired,
            AuthError::Policy(message) | AuthError::Config(message) => {
                TundraError::Validation { message }
            }
            AuthError::Crypto(msg) => TundraError::Crypto(msg),
        }
    }
}
