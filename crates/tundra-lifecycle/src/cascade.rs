//! Cascade coordinator — mirrors an account's freeze state onto every
//! post and comment it owns.
//!
//! The account flip and the fan-out cannot share a transaction, so each
//! collection is updated with one bulk write guarded by "not already in
//! the target state". Rerunning a cascade after a crash only touches
//! the items the first run missed, and items already converged are left
//! alone.

use tracing::{error, info};
use tundra_core::models::account::Account;
use tundra_core::models::content::ContentKind;
use tundra_core::models::freeze::CascadeDirection;
use tundra_core::repository::ContentRepository;
use uuid::Uuid;

/// Result of one cascade run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeReport {
    pub direction: CascadeDirection,
    pub posts_updated: u64,
    pub comments_updated: u64,
    /// Collections whose bulk write failed; retry to converge.
    pub failed: Vec<ContentKind>,
}

impl CascadeReport {
    fn new(direction: CascadeDirection) -> Self {
        Self {
            direction,
            posts_updated: 0,
            comments_updated: 0,
            failed: Vec::new(),
        }
    }

    pub fn converged(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_updated(&self) -> u64 {
        self.posts_updated + self.comments_updated
    }

    fn record(&mut self, kind: ContentKind, count: u64) {
        match kind {
            ContentKind::Post => self.posts_updated += count,
            ContentKind::Comment => self.comments_updated += count,
        }
    }
}

/// Result of removing everything an account owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub posts_deleted: u64,
    pub comments_deleted: u64,
    /// Comments on the removed posts, whoever wrote them. The owner's
    /// comments elsewhere are counted in `comments_deleted`.
    pub thread_comments_deleted: u64,
    pub failed: Vec<ContentKind>,
}

impl PurgeReport {
    pub fn converged(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Stateless fan-out over the content collections.
#[derive(Clone)]
pub struct CascadeCoordinator<C: ContentRepository> {
    content: C,
}

impl<C: ContentRepository> CascadeCoordinator<C> {
    pub fn new(content: C) -> Self {
        Self { content }
    }

    /// Bring every item owned by `owner_id` to `direction`.
    ///
    /// A failing collection does not stop the others; failures are
    /// logged and listed in the report instead of being returned.
    pub async fn apply(&self, owner_id: Uuid, direction: CascadeDirection) -> CascadeReport {
        let mut report = CascadeReport::new(direction);

        for kind in ContentKind::ALL {
            let result = match direction {
                CascadeDirection::Freeze(record) => {
                    self.content.freeze_owned(kind, owner_id, record).await
                }
                CascadeDirection::Unfreeze => self.content.unfreeze_owned(kind, owner_id).await,
            };
            match result {
                Ok(count) => report.record(kind, count),
                Err(e) => {
                    error!(
                        owner_id = %owner_id,
                        collection = kind.table(),
                        direction = direction.label(),
                        error = %e,
                        "Cascade step failed; left for retry"
                    );
                    report.failed.push(kind);
                }
            }
        }

        info!(
            owner_id = %owner_id,
            direction = direction.label(),
            posts = report.posts_updated,
            comments = report.comments_updated,
            converged = report.converged(),
            "Cascade applied"
        );
        report
    }

    /// Re-derive the target state from the account as stored and apply
    /// it again.
    pub async fn reconcile(&self, account: &Account) -> CascadeReport {
        let direction = match account.freeze {
            Some(record) => CascadeDirection::Freeze(record),
            None => CascadeDirection::Unfreeze,
        };
        self.apply(account.id, direction).await
    }

    /// Delete every post and comment owned by `owner_id`, and every
    /// comment left on those posts by others.
    pub async fn purge(&self, owner_id: Uuid) -> PurgeReport {
        let mut report = PurgeReport::default();

        // Threads go first; once the posts are gone they cannot be found.
        match self.content.delete_comments_on_owned_posts(owner_id).await {
            Ok(count) => report.thread_comments_deleted = count,
            Err(e) => {
                error!(
                    owner_id = %owner_id,
                    collection = ContentKind::Comment.table(),
                    error = %e,
                    "Thread purge failed"
                );
                report.failed.push(ContentKind::Comment);
            }
        }

        for kind in ContentKind::ALL {
            match self.content.delete_owned(kind, owner_id).await {
                Ok(count) => match kind {
                    ContentKind::Post => report.posts_deleted = count,
                    ContentKind::Comment => report.comments_deleted = count,
                },
                Err(e) => {
                    error!(
                        owner_id = %owner_id,
                        collection = kind.table(),
                        error = %e,
                        "Content purge failed"
                    );
                    if !report.failed.contains(&kind) {
                        report.failed.push(kind);
                    }
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tundra_core::models::freeze::FreezeRecord;

    #[test]
    fn report_tracks_counts_per_collection() {
        let record = FreezeRecord::new(Uuid::new_v4(), Utc::now());
        let mut report = CascadeReport::new(CascadeDirection::Freeze(record));
        report.record(ContentKind::Post, 3);
        report.record(ContentKind::Comment, 5);
        assert_eq!(report.posts_updated, 3);
        assert_eq!(report.comments_updated, 5);
        assert_eq!(report.total_updated(), 8);
        assert!(report.converged());
    }

    #[test]
    fn failed_collection_means_not_converged() {
        let mut report = CascadeReport::new(CascadeDirection::Unfreeze);
        report.failed.push(ContentKind::Comment);
        assert!(!report.converged());
    }
}
