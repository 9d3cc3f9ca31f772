//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. State transitions are exposed
//! as guarded writes: the guard lives in the storage statement itself,
//! and `Ok(None)` / `false` / `0` means it did not match.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::TundraResult;
use crate::models::{
    account::{Account, CreateAccount, PendingEmailChange},
    content::{Comment, ContentKind, CreateComment, CreatePost, Post},
    freeze::{FreezeRecord, RestoreRecord},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub trait AccountRepository: Send + Sync {
    fn create(&self, input: CreateAccount) -> impl Future<Output = TundraResult<Account>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TundraResult<Account>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = TundraResult<Account>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = TundraResult<PaginatedResult<Account>>> + Send;

    /// Set the freeze record, bump `credentials_changed_at` and clear any
    /// restore record, only if the account is not frozen.
    fn freeze(
        &self,
        id: Uuid,
        record: FreezeRecord,
    ) -> impl Future<Output = TundraResult<Option<Account>>> + Send;

    /// Clear the freeze record and set the restore record, only if the
    /// account is frozen (and, when given, frozen by `expected_frozen_by`).
    fn unfreeze(
        &self,
        id: Uuid,
        restore: RestoreRecord,
        expected_frozen_by: Option<Uuid>,
    ) -> impl Future<Output = TundraResult<Option<Account>>> + Send;

    /// Replace any pending email change.
    fn set_pending_email(
        &self,
        id: Uuid,
        pending: PendingEmailChange,
    ) -> impl Future<Output = TundraResult<Account>> + Send;

    /// Swap in the pending email and clear the pending fields, only if
    /// the stored code hash still equals `code_hash`.
    fn apply_pending_email(
        &self,
        id: Uuid,
        code_hash: &str,
        confirmed_at: DateTime<Utc>,
    ) -> impl Future<Output = TundraResult<Option<Account>>> + Send;

    /// Store a new password hash and bump `credentials_changed_at`.
    fn set_password(
        &self,
        id: Uuid,
        password_hash: String,
        changed_at: DateTime<Utc>,
    ) -> impl Future<Output = TundraResult<Account>> + Send;

    /// Remove the account only if it is frozen.
    fn delete_frozen(&self, id: Uuid) -> impl Future<Output = TundraResult<bool>> + Send;
}

// ---------------------------------------------------------------------------
// Posts & comments
// ---------------------------------------------------------------------------

pub trait ContentRepository: Send + Sync {
    fn create_post(&self, input: CreatePost) -> impl Future<Output = TundraResult<Post>> + Send;
    fn get_post(&self, id: Uuid) -> impl Future<Output = TundraResult<Post>> + Send;
    fn list_posts(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = TundraResult<PaginatedResult<Post>>> + Send;
    fn list_posts_by_owner(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = TundraResult<Vec<Post>>> + Send;

    fn create_comment(
        &self,
        input: CreateComment,
    ) -> impl Future<Output = TundraResult<Comment>> + Send;
    fn get_comment(&self, id: Uuid) -> impl Future<Output = TundraResult<Comment>> + Send;
    fn list_comments_by_owner(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = TundraResult<Vec<Comment>>> + Send;

    /// Mirror `record` onto every item of `kind` owned by `owner_id` whose
    /// freeze fields differ from it (unfrozen, or frozen under another
    /// record). Returns the number of items changed.
    fn freeze_owned(
        &self,
        kind: ContentKind,
        owner_id: Uuid,
        record: FreezeRecord,
    ) -> impl Future<Output = TundraResult<u64>> + Send;

    /// Clear the freeze mirror on every frozen item of `kind` owned by
    /// `owner_id`. Returns the number of items changed.
    fn unfreeze_owned(
        &self,
        kind: ContentKind,
        owner_id: Uuid,
    ) -> impl Future<Output = TundraResult<u64>> + Send;

    /// Remove every comment, whoever wrote it, on a post owned by
    /// `owner_id`. Must run before the posts themselves are removed.
    fn delete_comments_on_owned_posts(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = TundraResult<u64>> + Send;

    /// Remove every item of `kind` owned by `owner_id`.
    fn delete_owned(
        &self,
        kind: ContentKind,
        owner_id: Uuid,
    ) -> impl Future<Output = TundraResult<u64>> + Send;
}
