//! Account lifecycle manager — the `Active → Frozen → Active` /
//! `Frozen → Deleted` state machine.
//!
//! Preconditions are checked twice: once on the loaded account to give
//! a precise rejection, and again inside the storage write so that of
//! two concurrent identical requests only one takes effect.

use chrono::Utc;
use tracing::{error, info, warn};
use tundra_auth::password::SecretHasher;
use tundra_core::collaborator::ObjectStorage;
use tundra_core::error::{TundraError, TundraResult};
use tundra_core::models::account::{Account, AccountState, Actor, Role};
use tundra_core::models::freeze::{CascadeDirection, FreezeRecord, RestoreRecord};
use tundra_core::repository::{AccountRepository, ContentRepository, Pagination};
use uuid::Uuid;

use crate::cascade::{CascadeCoordinator, CascadeReport, PurgeReport};
use crate::config::LifecycleConfig;
use crate::policy::can_self_unfreeze;

/// A committed freeze or unfreeze and what its cascade managed.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub account: Account,
    pub cascade: CascadeReport,
}

/// A committed deletion and what its cleanup managed.
#[derive(Debug, Clone)]
pub struct DeletionOutcome {
    pub account_id: Uuid,
    pub state: AccountState,
    pub content: PurgeReport,
    pub objects_purged: bool,
}

impl DeletionOutcome {
    pub fn converged(&self) -> bool {
        self.content.converged() && self.objects_purged
    }
}

/// Totals from a reconciliation sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub accounts: u64,
    pub items_updated: u64,
    pub unconverged: Vec<Uuid>,
}

pub struct AccountLifecycleManager<A, C, O, H>
where
    A: AccountRepository,
    C: ContentRepository,
    O: ObjectStorage,
    H: SecretHasher,
{
    accounts: A,
    cascade: CascadeCoordinator<C>,
    objects: O,
    hasher: H,
    config: LifecycleConfig,
}

impl<A, C, O, H> AccountLifecycleManager<A, C, O, H>
where
    A: AccountRepository,
    C: ContentRepository,
    O: ObjectStorage,
    H: SecretHasher,
{
    pub fn new(accounts: A, content: C, objects: O, hasher: H, config: LifecycleConfig) -> Self {
        Self {
            accounts,
            cascade: CascadeCoordinator::new(content),
            objects,
            hasher,
            config,
        }
    }

    pub fn cascade(&self) -> &CascadeCoordinator<C> {
        &self.cascade
    }

    /// Freeze `target`. The actor is either the holder (self-freeze) or
    /// an active administrator.
    pub async fn freeze(&self, target: Uuid, actor: Actor) -> TundraResult<TransitionOutcome> {
        if actor.id != target {
            self.ensure_active_admin(actor).await?;
        }

        let account = self.accounts.get_by_id(target).await?;
        if account.is_frozen() {
            return Err(TundraError::conflict("account is already frozen"));
        }

        let record = FreezeRecord::new(actor.id, Utc::now());
        let account = self
            .accounts
            .freeze(target, record)
            .await?
            .ok_or_else(|| {
                warn!(account_id = %target, actor_id = %actor.id, "Freeze lost a race");
                TundraError::conflict("account is already frozen")
            })?;

        info!(
            account_id = %target,
            actor_id = %actor.id,
            self_imposed = record.is_self_imposed(target),
            "Account frozen"
        );

        let cascade = self
            .cascade
            .apply(target, CascadeDirection::Freeze(record))
            .await;
        Ok(TransitionOutcome { account, cascade })
    }

    /// Lift any freeze on `target`. No further check beyond the admin
    /// being active.
    pub async fn unfreeze_by_admin(
        &self,
        target: Uuid,
        admin: Actor,
    ) -> TundraResult<TransitionOutcome> {
        self.ensure_active_admin(admin).await?;

        let account = self.accounts.get_by_id(target).await?;
        if !account.is_frozen() {
            return Err(TundraError::conflict("account is not frozen"));
        }

        let restore = RestoreRecord::new(admin.id, Utc::now());
        let account = self
            .accounts
            .unfreeze(target, restore, None)
            .await?
            .ok_or_else(|| {
                warn!(account_id = %target, actor_id = %admin.id, "Unfreeze lost a race");
                TundraError::conflict("account is not frozen")
            })?;

        info!(account_id = %target, actor_id = %admin.id, "Account unfrozen by admin");

        let cascade = self.cascade.apply(target, CascadeDirection::Unfreeze).await;
        Ok(TransitionOutcome { account, cascade })
    }

    /// The holder lifts their own freeze by re-supplying credentials.
    /// A freeze imposed by an administrator is rejected with `Conflict`.
    pub async fn unfreeze_by_holder(
        &self,
        email: &str,
        password: &str,
    ) -> TundraResult<TransitionOutcome> {
        let account = self.accounts.get_by_email(email).await?;

        if !self.hasher.verify(password, &account.password_hash)? {
            return Err(TundraError::InvalidCredential);
        }

        let freeze = account
            .freeze
            .ok_or_else(|| TundraError::conflict("account is not frozen"))?;
        if !can_self_unfreeze(&freeze, account.id) {
            return Err(TundraError::conflict(
                "account was frozen by an administrator",
            ));
        }

        let restore = RestoreRecord::new(account.id, Utc::now());
        // Also match `frozen_by`, so an admin freeze that lands after the
        // check above is not lifted here.
        let account = self
            .accounts
            .unfreeze(account.id, restore, Some(account.id))
            .await?
            .ok_or_else(|| {
                warn!(account_id = %account.id, "Self-unfreeze lost a race");
                TundraError::conflict("account freeze changed during unfreeze")
            })?;

        info!(account_id = %account.id, "Account unfrozen by holder");

        let cascade = self
            .cascade
            .apply(account.id, CascadeDirection::Unfreeze)
            .await;
        Ok(TransitionOutcome { account, cascade })
    }

    /// Permanently remove a frozen account, its content and its files.
    ///
    /// Once the account row is gone the rest is cleanup: failures are
    /// logged and reported, never rolled back.
    pub async fn delete(&self, target: Uuid, admin: Actor) -> TundraResult<DeletionOutcome> {
        self.ensure_active_admin(admin).await?;

        let account = self.accounts.get_by_id(target).await?;
        if !account.is_frozen() {
            return Err(TundraError::conflict(
                "cannot delete an account that is not frozen",
            ));
        }

        if !self.accounts.delete_frozen(target).await? {
            warn!(account_id = %target, actor_id = %admin.id, "Delete lost a race");
            return Err(TundraError::conflict(
                "cannot delete an account that is not frozen",
            ));
        }

        info!(account_id = %target, actor_id = %admin.id, "Account deleted");

        let content = self.cascade.purge(target).await;
        let prefix = self.config.object_prefix(target);
        let objects_purged = match self.objects.delete_by_prefix(&prefix).await {
            Ok(_) => true,
            Err(e) => {
                error!(account_id = %target, prefix = %prefix, error = %e, "Object purge failed");
                false
            }
        };

        Ok(DeletionOutcome {
            account_id: target,
            state: AccountState::Deleted,
            content,
            objects_purged,
        })
    }

    /// Re-run the cascade for every account, page by page.
    pub async fn reconcile_all(&self) -> TundraResult<SweepReport> {
        let mut report = SweepReport::default();
        let limit = self.config.sweep_page_size.max(1);
        let mut offset = 0;

        loop {
            let page = self.accounts.list(Pagination { offset, limit }).await?;
            let fetched = page.items.len() as u64;

            for listed in &page.items {
                // The page can be stale by the time its turn comes; the
                // direction is taken from the account as stored now.
                let account = match self.accounts.get_by_id(listed.id).await {
                    Ok(account) => account,
                    Err(TundraError::NotFound { .. }) => continue,
                    Err(e) => {
                        error!(account_id = %listed.id, error = %e, "Sweep could not reload account");
                        report.unconverged.push(listed.id);
                        continue;
                    }
                };

                let cascade = self.cascade.reconcile(&account).await;
                report.accounts += 1;
                report.items_updated += cascade.total_updated();
                if !cascade.converged() {
                    report.unconverged.push(account.id);
                }
            }

            offset += fetched;
            if fetched < limit || offset >= page.total {
                break;
            }
        }

        info!(
            accounts = report.accounts,
            items_updated = report.items_updated,
            unconverged = report.unconverged.len(),
            "Reconciliation sweep finished"
        );
        Ok(report)
    }

    /// The actor must exist, hold the admin role and not be frozen.
    async fn ensure_active_admin(&self, actor: Actor) -> TundraResult<()> {
        if actor.role != Role::Admin {
            return Err(TundraError::forbidden("administrator role required"));
        }
        let account = match self.accounts.get_by_id(actor.id).await {
            Ok(a) => a,
            Err(TundraError::NotFound { .. }) => {
                return Err(TundraError::forbidden("unknown actor"));
            }
            Err(e) => return Err(e),
        };
        if !account.is_admin() {
            return Err(TundraError::forbidden("administrator role required"));
        }
        if account.is_frozen() {
            return Err(TundraError::forbidden(
                "a frozen account cannot act on other accounts",
            ));
        }
        Ok(())
    }
}
