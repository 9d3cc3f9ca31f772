//! SurrealDB repository implementations.

mod account;
mod content;

pub use account::SurrealAccountRepository;
pub use content::SurrealContentRepository;

use chrono::{DateTime, Utc};
use surrealdb::IndexedResults;
use surrealdb_types::{QueryError, SurrealValue};
use tundra_core::models::freeze::FreezeRecord;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Corrupt(format!("invalid {what} UUID: {e}")))
}

fn parse_optional_uuid(raw: Option<String>, what: &str) -> Result<Option<Uuid>, DbError> {
    raw.as_deref().map(|r| parse_uuid(r, what)).transpose()
}

/// Whether `err` is a commit conflict with a concurrent transaction.
fn is_write_conflict(err: &surrealdb::Error) -> bool {
    matches!(err.query_details(), Some(QueryError::TransactionConflict))
}

/// Rows returned by a guarded write.
///
/// A commit conflict means a concurrent write to the same record won;
/// that is reported the same way as a guard that did not match.
fn guarded_rows<T: SurrealValue>(
    response: Result<IndexedResults, surrealdb::Error>,
) -> Result<Vec<T>, DbError> {
    let response = match response {
        Ok(response) => response,
        Err(e) if is_write_conflict(&e) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut response = match response.check() {
        Ok(response) => response,
        Err(e) if is_write_conflict(&e) => return Ok(Vec::new()),
        Err(e) => return Err(DbError::Query(e.to_string())),
    };
    Ok(response.take(0)?)
}

/// Rebuild a freeze record from its two columns, rejecting rows where
/// only one is set.
fn decode_freeze(
    frozen_at: Option<DateTime<Utc>>,
    frozen_by: Option<String>,
    owner: &str,
) -> Result<Option<FreezeRecord>, DbError> {
    let frozen_by = parse_optional_uuid(frozen_by, "frozen_by")?;
    FreezeRecord::from_parts(frozen_at, frozen_by)
        .map_err(|e| DbError::Corrupt(format!("{owner}: {e}")))
}
