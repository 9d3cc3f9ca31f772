//! SurrealDB implementation of [`AccountRepository`].
//!
//! Every state transition is a single `UPDATE`/`DELETE` whose `WHERE`
//! clause is the transition's precondition. An empty result means the
//! guard did not match; callers decide whether that is a conflict or a
//! missing record.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tundra_core::error::TundraResult;
use tundra_core::models::account::{Account, CreateAccount, PendingEmailChange, Role};
use tundra_core::models::freeze::{FreezeRecord, RestoreRecord};
use tundra_core::repository::{AccountRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use super::{CountRow, decode_freeze, guarded_rows, parse_optional_uuid, parse_uuid};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct AccountRow {
    email: String,
    password_hash: String,
    role: String,
    email_confirmed_at: Option<DateTime<Utc>>,
    pending_email: Option<String>,
    pending_email_code: Option<String>,
    pending_email_code_expires_at: Option<DateTime<Utc>>,
    frozen_at: Option<DateTime<Utc>>,
    frozen_by: Option<String>,
    restored_at: Option<DateTime<Utc>>,
    restored_by: Option<String>,
    credentials_changed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AccountRowWithId {
    record_id: String,
    email: String,
    password_hash: String,
    role: String,
    email_confirmed_at: Option<DateTime<Utc>>,
    pending_email: Option<String>,
    pending_email_code: Option<String>,
    pending_email_code_expires_at: Option<DateTime<Utc>>,
    frozen_at: Option<DateTime<Utc>>,
    frozen_by: Option<String>,
    restored_at: Option<DateTime<Utc>>,
    restored_by: Option<String>,
    credentials_changed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    match s {
        "Admin" => Ok(Role::Admin),
        "User" => Ok(Role::User),
        other => Err(DbError::Corrupt(format!("unknown account role: {other}"))),
    }
}

fn role_to_string(role: Role) -> &'static str {
    match role {
        Role::Admin => "Admin",
        Role::User => "User",
    }
}

impl AccountRow {
    fn into_account(self, id: Uuid) -> Result<Account, DbError> {
        let owner = format!("account:{id}");
        let pending_email = match (
            self.pending_email,
            self.pending_email_code,
            self.pending_email_code_expires_at,
        ) {
            (Some(email), Some(code_hash), Some(expires_at)) => Some(PendingEmailChange {
                email,
                code_hash,
                expires_at,
            }),
            (None, None, None) => None,
            _ => {
                return Err(DbError::Corrupt(format!(
                    "{owner}: partial pending email change"
                )));
            }
        };
        let restore = match (
            self.restored_at,
            parse_optional_uuid(self.restored_by, "restored_by")?,
        ) {
            (Some(at), Some(by)) => Some(RestoreRecord::new(by, at)),
            _ => None,
        };

        Ok(Account {
            id,
            email: self.email,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            email_confirmed_at: self.email_confirmed_at,
            pending_email,
            freeze: decode_freeze(self.frozen_at, self.frozen_by, &owner)?,
            restore,
            credentials_changed_at: self.credentials_changed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl AccountRowWithId {
    fn try_into_account(self) -> Result<Account, DbError> {
        let id = parse_uuid(&self.record_id, "account")?;
        AccountRow {
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            email_confirmed_at: self.email_confirmed_at,
            pending_email: self.pending_email,
            pending_email_code: self.pending_email_code,
            pending_email_code_expires_at: self.pending_email_code_expires_at,
            frozen_at: self.frozen_at,
            frozen_by: self.frozen_by,
            restored_at: self.restored_at,
            restored_by: self.restored_by,
            credentials_changed_at: self.credentials_changed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_account(id)
    }
}

/// SurrealDB implementation of the Account repository.
#[derive(Clone)]
pub struct SurrealAccountRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAccountRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// First row of a statement's result decoded as an account, or
    /// `None` when the statement touched nothing.
    fn first_account(rows: Vec<AccountRow>, id: Uuid) -> Result<Option<Account>, DbError> {
        rows.into_iter()
            .next()
            .map(|row| row.into_account(id))
            .transpose()
    }
}

impl<C: Connection> AccountRepository for SurrealAccountRepository<C> {
    async fn create(&self, input: CreateAccount) -> TundraResult<Account> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('account', $id) SET \
                 email = $email, \
                 password_hash = $password_hash, \
                 role = $role",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("password_hash", input.password_hash))
            .bind(("role", role_to_string(input.role).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        let account = Self::first_account(rows, id)?.ok_or(DbError::NotFound {
            entity: "account".into(),
            id: id_str,
        })?;

        Ok(account)
    }

    async fn get_by_id(&self, id: Uuid) -> TundraResult<Account> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('account', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        let account = Self::first_account(rows, id)?.ok_or(DbError::NotFound {
            entity: "account".into(),
            id: id_str,
        })?;

        Ok(account)
    }

    async fn get_by_email(&self, email: &str) -> TundraResult<Account> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM account WHERE email = $email")
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "account".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_account()?)
    }

    async fn list(&self, pagination: Pagination) -> TundraResult<PaginatedResult<Account>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM account GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM account \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(AccountRowWithId::try_into_account)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn freeze(&self, id: Uuid, record: FreezeRecord) -> TundraResult<Option<Account>> {
        let result = self
            .db
            .query(
                "UPDATE type::record('account', $id) SET \
                 frozen_at = $frozen_at, \
                 frozen_by = $frozen_by, \
                 credentials_changed_at = $frozen_at, \
                 restored_at = NONE, \
                 restored_by = NONE, \
                 updated_at = time::now() \
                 WHERE frozen_at IS NONE AND frozen_by IS NONE",
            )
            .bind(("id", id.to_string()))
            .bind(("frozen_at", record.frozen_at))
            .bind(("frozen_by", record.frozen_by.to_string()))
            .await;

        let rows: Vec<AccountRow> = guarded_rows(result)?;
        Ok(Self::first_account(rows, id)?)
    }

    async fn unfreeze(
        &self,
        id: Uuid,
        restore: RestoreRecord,
        expected_frozen_by: Option<Uuid>,
    ) -> TundraResult<Option<Account>> {
        let mut guard = String::from("frozen_at IS NOT NONE");
        if expected_frozen_by.is_some() {
            guard.push_str(" AND frozen_by = $expected_frozen_by");
        }

        let query = format!(
            "UPDATE type::record('account', $id) SET \
             frozen_at = NONE, \
             frozen_by = NONE, \
             restored_at = $restored_at, \
             restored_by = $restored_by, \
             updated_at = time::now() \
             WHERE {guard}"
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("restored_at", restore.restored_at))
            .bind(("restored_by", restore.restored_by.to_string()));
        if let Some(expected) = expected_frozen_by {
            builder = builder.bind(("expected_frozen_by", expected.to_string()));
        }

        let rows: Vec<AccountRow> = guarded_rows(builder.await)?;
        Ok(Self::first_account(rows, id)?)
    }

    async fn set_pending_email(
        &self,
        id: Uuid,
        pending: PendingEmailChange,
    ) -> TundraResult<Account> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('account', $id) SET \
                 pending_email = $pending_email, \
                 pending_email_code = $pending_email_code, \
                 pending_email_code_expires_at = $expires_at, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("pending_email", pending.email))
            .bind(("pending_email_code", pending.code_hash))
            .bind(("expires_at", pending.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        let account = Self::first_account(rows, id)?.ok_or(DbError::NotFound {
            entity: "account".into(),
            id: id_str,
        })?;

        Ok(account)
    }

    async fn apply_pending_email(
        &self,
        id: Uuid,
        code_hash: &str,
        confirmed_at: DateTime<Utc>,
    ) -> TundraResult<Option<Account>> {
        // `email` is assigned before the pending columns are cleared.
        let result = self
            .db
            .query(
                "UPDATE type::record('account', $id) SET \
                 email = pending_email, \
                 email_confirmed_at = $confirmed_at, \
                 pending_email = NONE, \
                 pending_email_code = NONE, \
                 pending_email_code_expires_at = NONE, \
                 updated_at = time::now() \
                 WHERE pending_email IS NOT NONE \
                 AND pending_email_code = $code_hash",
            )
            .bind(("id", id.to_string()))
            .bind(("code_hash", code_hash.to_string()))
            .bind(("confirmed_at", confirmed_at))
            .await;

        let rows: Vec<AccountRow> = guarded_rows(result)?;
        Ok(Self::first_account(rows, id)?)
    }

    async fn set_password(
        &self,
        id: Uuid,
        password_hash: String,
        changed_at: DateTime<Utc>,
    ) -> TundraResult<Account> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('account', $id) SET \
                 password_hash = $password_hash, \
                 credentials_changed_at = $changed_at, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("password_hash", password_hash))
            .bind(("changed_at", changed_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        let account = Self::first_account(rows, id)?.ok_or(DbError::NotFound {
            entity: "account".into(),
            id: id_str,
        })?;

        Ok(account)
    }

    async fn delete_frozen(&self, id: Uuid) -> TundraResult<bool> {
        let result = self
            .db
            .query(
                "DELETE type::record('account', $id) \
                 WHERE frozen_at IS NOT NONE RETURN BEFORE",
            )
            .bind(("id", id.to_string()))
            .await;

        let rows: Vec<AccountRow> = guarded_rows(result)?;
        Ok(!rows.is_empty())
    }
}
