//! Lifecycle configuration.

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Object-storage folder holding every account's files
    /// (default: `users`, giving `users/<account_id>`).
    pub object_namespace_prefix: String,
    /// Accounts loaded per page during a reconciliation sweep.
    pub sweep_page_size: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            object_namespace_prefix: "users".into(),
            sweep_page_size: 100,
        }
    }
}

impl LifecycleConfig {
    /// Object-storage prefix owned by `account_id`.
    pub fn object_prefix(&self, account_id: Uuid) -> String {
        format!(
            "{}/{account_id}",
            self.object_namespace_prefix.trim_end_matches('/')
        )
    }
}
