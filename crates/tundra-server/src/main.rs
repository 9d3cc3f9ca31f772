//! Tundra maintenance binary: brings the schema up to date and runs one
//! freeze reconciliation sweep, closing any cascade a crash left half
//! applied.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use tundra_auth::{Argon2Hasher, AuthConfig};
use tundra_db::repository::{SurrealAccountRepository, SurrealContentRepository};
use tundra_db::{DbConfig, DbManager, FsObjectStorage};
use tundra_lifecycle::{AccountLifecycleManager, LifecycleConfig};

const DEFAULT_LOG_FILTER: &str =
    "tundra_server=info,tundra_lifecycle=info,tundra_auth=info,tundra_db=info";

struct ServerConfig {
    db: DbConfig,
    auth: AuthConfig,
    lifecycle: LifecycleConfig,
    object_root: PathBuf,
}

impl ServerConfig {
    fn from_env() -> Self {
        let auth = AuthConfig {
            pepper: std::env::var("TUNDRA_PEPPER").ok(),
            ..AuthConfig::default()
        };
        let lifecycle = match std::env::var("TUNDRA_OBJECT_PREFIX") {
            Ok(prefix) => LifecycleConfig {
                object_namespace_prefix: prefix,
                ..LifecycleConfig::default()
            },
            Err(_) => LifecycleConfig::default(),
        };
        Self {
            db: DbConfig::from_env(),
            auth,
            lifecycle,
            object_root: std::env::var("TUNDRA_OBJECT_ROOT")
                .unwrap_or_else(|_| "./objects".into())
                .into(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    let config = ServerConfig::from_env();
    tracing::info!(object_root = %config.object_root.display(), "Starting Tundra maintenance run");

    let manager = match DbManager::connect(&config.db).await {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(error = %e, "Could not open the database");
            return ExitCode::FAILURE;
        }
    };

    let db = manager.client().clone();
    let lifecycle = AccountLifecycleManager::new(
        SurrealAccountRepository::new(db.clone()),
        SurrealContentRepository::new(db),
        FsObjectStorage::new(config.object_root),
        Argon2Hasher::new(config.auth.pepper),
        config.lifecycle,
    );

    match lifecycle.reconcile_all().await {
        Ok(report) if report.unconverged.is_empty() => ExitCode::SUCCESS,
        Ok(report) => {
            tracing::warn!(
                unconverged = ?report.unconverged,
                "Some accounts did not converge; rerun the sweep"
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Reconciliation sweep failed");
            ExitCode::FAILURE
        }
    }
}
