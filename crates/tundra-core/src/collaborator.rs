//! Narrow interfaces to collaborators this core consumes but does not
//! own: object storage and outbound notifications.

use serde_json::{Value, json};

use crate::error::TundraResult;

/// Object storage keyed by slash-separated paths.
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `path`, returning the final key.
    fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = TundraResult<String>> + Send;
    fn delete_one(&self, key: &str) -> impl Future<Output = TundraResult<bool>> + Send;
    fn delete_many(&self, keys: &[String]) -> impl Future<Output = TundraResult<bool>> + Send;
    /// Remove every object whose key starts with `prefix`.
    fn delete_by_prefix(&self, prefix: &str) -> impl Future<Output = TundraResult<bool>> + Send;
}

/// Events handed to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Sent to the new address; carries the code that confirms it.
    ConfirmEmailChange { to: String, code: String },
    /// Informational only; the change is already committed.
    PasswordChanged { to: String, code: String },
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConfirmEmailChange { .. } => "confirm_email_change",
            Self::PasswordChanged { .. } => "password_changed",
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Self::ConfirmEmailChange { to, .. } | Self::PasswordChanged { to, .. } => to,
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            Self::ConfirmEmailChange { to, code } | Self::PasswordChanged { to, code } => {
                json!({ "to": to, "code": code })
            }
        }
    }
}

/// Fire-and-forget dispatch; no delivery guarantee is expected.
pub trait Notifier: Send + Sync {
    fn emit(&self, notification: Notification);
}
