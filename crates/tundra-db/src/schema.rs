//! Schema definitions and migration runner for SurrealDB.
//!
//! All tables are SCHEMAFULL. UUIDs are stored as strings and enums as
//! strings with ASSERT constraints. Freeze state is two optional
//! columns (`frozen_at`, `frozen_by`) on every table that carries it.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "accounts_and_content",
    sql: SCHEMA_V1,
}];

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Accounts
-- =======================================================================
DEFINE TABLE account SCHEMAFULL;
DEFINE FIELD email ON TABLE account TYPE string;
DEFINE FIELD password_hash ON TABLE account TYPE string;
DEFINE FIELD role ON TABLE account TYPE string \
    ASSERT $value IN ['Admin', 'User'];
DEFINE FIELD email_confirmed_at ON TABLE account TYPE option<datetime>;
DEFINE FIELD pending_email ON TABLE account TYPE option<string>;
DEFINE FIELD pending_email_code ON TABLE account TYPE option<string>;
DEFINE FIELD pending_email_code_expires_at ON TABLE account \
    TYPE option<datetime>;
DEFINE FIELD frozen_at ON TABLE account TYPE option<datetime>;
DEFINE FIELD frozen_by ON TABLE account TYPE option<string>;
DEFINE FIELD restored_at ON TABLE account TYPE option<datetime>;
DEFINE FIELD restored_by ON TABLE account TYPE option<string>;
DEFINE FIELD credentials_changed_at ON TABLE account \
    TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE account TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE account TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_account_email ON TABLE account COLUMNS email UNIQUE;

-- =======================================================================
-- Posts (owned by an account)
-- =======================================================================
DEFINE TABLE post SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE post TYPE string;
DEFINE FIELD body ON TABLE post TYPE string;
DEFINE FIELD visibility ON TABLE post TYPE string \
    ASSERT $value IN ['Public', 'Audience', 'OnlyMe'];
DEFINE FIELD audience ON TABLE post TYPE array<string> DEFAULT [];
DEFINE FIELD allow_comments ON TABLE post TYPE bool DEFAULT true;
DEFINE FIELD frozen_at ON TABLE post TYPE option<datetime>;
DEFINE FIELD frozen_by ON TABLE post TYPE option<string>;
DEFINE FIELD created_at ON TABLE post TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE post TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_post_owner ON TABLE post COLUMNS owner_id;

-- =======================================================================
-- Comments (owned by an account, attached to a post)
-- =======================================================================
DEFINE TABLE comment SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE comment TYPE string;
DEFINE FIELD post_id ON TABLE comment TYPE string;
DEFINE FIELD reply_to ON TABLE comment TYPE option<string>;
DEFINE FIELD body ON TABLE comment TYPE string;
DEFINE FIELD frozen_at ON TABLE comment TYPE option<datetime>;
DEFINE FIELD frozen_by ON TABLE comment TYPE option<string>;
DEFINE FIELD created_at ON TABLE comment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE comment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_comment_owner ON TABLE comment COLUMNS owner_id;
DEFINE INDEX idx_comment_post ON TABLE comment COLUMNS post_id;
";

/// Run all pending migrations against the provided database.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > current_version)
    {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "could not record v{}: {}",
                    migration.version, e,
                ))
            })?;
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
