//! Database-specific error types and conversions.

use tundra_core::error::TundraError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Object storage error: {0}")]
    Objects(#[from] std::io::Error),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for TundraError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TundraError::NotFound { entity, id },
            other => TundraError::Database(other.to_string()),
        }
    }
}
