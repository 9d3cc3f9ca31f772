//! Tundra Database — SurrealDB connection management, schema
//! migrations, repository implementations and filesystem object
//! storage.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Repositories for the `tundra-core` traits ([`repository`])
//! - Object storage on the local filesystem ([`FsObjectStorage`])
//! - Error types ([`DbError`])

mod connection;
mod error;
mod objects;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use objects::FsObjectStorage;
pub use schema::{run_migrations, schema_v1};
