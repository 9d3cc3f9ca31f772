//! Object storage on the local filesystem.
//!
//! Keys are slash-separated relative paths under a root directory, so
//! `delete_by_prefix("users/<id>")` removes the account's whole folder.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::debug;
use tundra_core::collaborator::ObjectStorage;
use tundra_core::error::{TundraError, TundraResult};
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, Clone)]
pub struct FsObjectStorage {
    root: PathBuf,
}

impl FsObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `key` under the root, refusing anything that could escape
    /// it.
    fn resolve(&self, key: &str) -> TundraResult<PathBuf> {
        let relative = Path::new(key.trim_matches('/'));
        let safe = !relative.as_os_str().is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(TundraError::Validation {
                message: format!("invalid object key: {key:?}"),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStorage for FsObjectStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> TundraResult<String> {
        let key = format!("{}/{}", path.trim_matches('/'), Uuid::new_v4());
        let target = self.resolve(&key)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(DbError::from)?;
        }
        fs::write(&target, bytes).await.map_err(DbError::from)?;
        debug!(key = %key, "Object stored");
        Ok(key)
    }

    async fn delete_one(&self, key: &str) -> TundraResult<bool> {
        let target = self.resolve(key)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DbError::from(e).into()),
        }
    }

    async fn delete_many(&self, keys: &[String]) -> TundraResult<bool> {
        let mut all = true;
        for key in keys {
            all &= self.delete_one(key).await?;
        }
        Ok(all)
    }

    async fn delete_by_prefix(&self, prefix: &str) -> TundraResult<bool> {
        let target = self.resolve(prefix)?;
        let metadata = match fs::metadata(&target).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(DbError::from(e).into()),
        };
        if metadata.is_dir() {
            fs::remove_dir_all(&target).await.map_err(DbError::from)?;
        } else {
            fs::remove_file(&target).await.map_err(DbError::from)?;
        }
        debug!(prefix = %prefix, "Objects purged");
        Ok(true)
    }
}
