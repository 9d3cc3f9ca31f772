//! Tundra Auth — the credential gate: Argon2id secret verification,
//! one-time codes, and the email-change and password-change flows.

pub mod code;
pub mod config;
pub mod error;
pub mod gate;
pub mod password;

pub use code::{CodeSource, NumericCodeSource, OneTimeCode};
pub use config::AuthConfig;
pub use error::AuthError;
pub use gate::CredentialGate;
pub use password::{Argon2Hasher, SecretHasher};
