//! Account domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::freeze::{FreezeRecord, RestoreRecord};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

/// Lifecycle state derived from the freeze record.
///
/// `Deleted` is never observed on a loaded account; it names the
/// terminal transition for logging and outcomes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountState {
    Active,
    Frozen,
    Deleted,
}

/// An email change waiting for its one-time code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingEmailChange {
    pub email: String,
    /// Argon2id hash of the one-time code, never the code itself.
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub pending_email: Option<PendingEmailChange>,
    pub freeze: Option<FreezeRecord>,
    pub restore: Option<RestoreRecord>,
    /// Bumped on freeze and password change; sessions issued before it
    /// are stale.
    pub credentials_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn state(&self) -> AccountState {
        if self.freeze.is_some() {
            AccountState::Frozen
        } else {
            AccountState::Active
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether a session issued at `issued_at` is still acceptable.
    pub fn accepts_session_issued_at(&self, issued_at: DateTime<Utc>) -> bool {
        if self.is_frozen() {
            return false;
        }
        match self.credentials_changed_at {
            Some(changed) => issued_at >= changed,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub email: String,
    /// Already hashed; registration owns the plaintext.
    pub password_hash: String,
    pub role: Role,
}

/// The authenticated caller of a lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn admin(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }

    pub fn user(id: Uuid) -> Self {
        Self {
            id,
            role: Role::User,
        }
    }
}
