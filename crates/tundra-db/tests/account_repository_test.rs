//! Integration tests for the Account repository using in-memory SurrealDB.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tundra_core::error::TundraError;
use tundra_core::models::account::{CreateAccount, PendingEmailChange, Role};
use tundra_core::models::freeze::{FreezeRecord, RestoreRecord};
use tundra_core::repository::{AccountRepository, Pagination};
use tundra_db::repository::SurrealAccountRepository;
use uuid::Uuid;

async fn setup() -> SurrealAccountRepository<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tundra_db::run_migrations(&db).await.unwrap();
    SurrealAccountRepository::new(db)
}

fn new_account(email: &str, role: Role) -> CreateAccount {
    CreateAccount {
        email: email.into(),
        password_hash: "$argon2id$placeholder".into(),
        role,
    }
}

#[tokio::test]
async fn create_and_get_account() {
    let repo = setup().await;

    let account = repo
        .create(new_account("alice@example.com", Role::User))
        .await
        .unwrap();
    assert_eq!(account.email, "alice@example.com");
    assert_eq!(account.role, Role::User);
    assert!(account.freeze.is_none());
    assert!(account.restore.is_none());
    assert!(account.pending_email.is_none());

    let by_id = repo.get_by_id(account.id).await.unwrap();
    assert_eq!(by_id.id, account.id);

    let by_email = repo.get_by_email("alice@example.com").await.unwrap();
    assert_eq!(by_email.id, account.id);
}

#[tokio::test]
async fn missing_account_is_not_found() {
    let repo = setup().await;
    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, TundraError::NotFound { .. }));
    let err = repo.get_by_email("ghost@example.com").await.unwrap_err();
    assert!(matches!(err, TundraError::NotFound { .. }));
}

#[tokio::test]
async fn freeze_is_guarded_by_current_state() {
    let repo = setup().await;
    let account = repo
        .create(new_account("bob@example.com", Role::User))
        .await
        .unwrap();
    let admin = Uuid::new_v4();

    let first = FreezeRecord::new(admin, Utc::now());
    let frozen = repo.freeze(account.id, first).await.unwrap().unwrap();
    assert_eq!(frozen.freeze.unwrap().frozen_by, admin);
    assert!(frozen.credentials_changed_at.is_some());

    // A second freeze does not match the guard and changes nothing.
    let second = FreezeRecord::new(account.id, Utc::now());
    assert!(repo.freeze(account.id, second).await.unwrap().is_none());
    let stored = repo.get_by_id(account.id).await.unwrap();
    assert_eq!(stored.freeze.unwrap().frozen_by, admin);
}

#[tokio::test]
async fn freeze_of_missing_account_matches_nothing() {
    let repo = setup().await;
    let record = FreezeRecord::new(Uuid::new_v4(), Utc::now());
    assert!(repo.freeze(Uuid::new_v4(), record).await.unwrap().is_none());
}

#[tokio::test]
async fn unfreeze_sets_restore_and_clears_freeze() {
    let repo = setup().await;
    let account = repo
        .create(new_account("carol@example.com", Role::User))
        .await
        .unwrap();
    let admin = Uuid::new_v4();

    // Not frozen yet: guard fails.
    let restore = RestoreRecord::new(admin, Utc::now());
    assert!(repo.unfreeze(account.id, restore, None).await.unwrap().is_none());

    repo.freeze(account.id, FreezeRecord::new(admin, Utc::now()))
        .await
        .unwrap()
        .unwrap();
    let restored = repo
        .unfreeze(account.id, restore, None)
        .await
        .unwrap()
        .unwrap();
    assert!(restored.freeze.is_none());
    assert_eq!(restored.restore.unwrap().restored_by, admin);

    // Freezing again clears the restore record.
    let refrozen = repo
        .freeze(account.id, FreezeRecord::new(admin, Utc::now()))
        .await
        .unwrap()
        .unwrap();
    assert!(refrozen.restore.is_none());
}

#[tokio::test]
async fn unfreeze_with_expected_actor_checks_frozen_by() {
    let repo = setup().await;
    let account = repo
        .create(new_account("dave@example.com", Role::User))
        .await
        .unwrap();
    let admin = Uuid::new_v4();
    repo.freeze(account.id, FreezeRecord::new(admin, Utc::now()))
        .await
        .unwrap()
        .unwrap();

    let restore = RestoreRecord::new(account.id, Utc::now());
    let attempt = repo
        .unfreeze(account.id, restore, Some(account.id))
        .await
        .unwrap();
    assert!(attempt.is_none(), "admin freeze must not match holder guard");
    assert!(repo.get_by_id(account.id).await.unwrap().is_frozen());
}

#[tokio::test]
async fn pending_email_is_applied_once() {
    let repo = setup().await;
    let account = repo
        .create(new_account("erin@example.com", Role::User))
        .await
        .unwrap();

    let pending = PendingEmailChange {
        email: "erin.new@example.com".into(),
        code_hash: "hash-1".into(),
        expires_at: Utc::now() + Duration::minutes(10),
    };
    let with_pending = repo.set_pending_email(account.id, pending.clone()).await.unwrap();
    assert_eq!(with_pending.pending_email, Some(pending));

    // Wrong hash does not match.
    assert!(
        repo.apply_pending_email(account.id, "hash-2", Utc::now())
            .await
            .unwrap()
            .is_none()
    );

    let applied = repo
        .apply_pending_email(account.id, "hash-1", Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(applied.email, "erin.new@example.com");
    assert!(applied.pending_email.is_none());
    assert!(applied.email_confirmed_at.is_some());

    // Already redeemed.
    assert!(
        repo.apply_pending_email(account.id, "hash-1", Utc::now())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn set_password_bumps_credentials_changed_at() {
    let repo = setup().await;
    let account = repo
        .create(new_account("frank@example.com", Role::User))
        .await
        .unwrap();
    assert!(account.credentials_changed_at.is_none());

    let changed_at = Utc::now();
    let updated = repo
        .set_password(account.id, "$argon2id$new".into(), changed_at)
        .await
        .unwrap();
    assert_eq!(updated.password_hash, "$argon2id$new");
    assert!(updated.credentials_changed_at.is_some());
}

#[tokio::test]
async fn delete_requires_frozen_account() {
    let repo = setup().await;
    let account = repo
        .create(new_account("gina@example.com", Role::User))
        .await
        .unwrap();

    assert!(!repo.delete_frozen(account.id).await.unwrap());
    assert!(repo.get_by_id(account.id).await.is_ok());

    repo.freeze(account.id, FreezeRecord::new(Uuid::new_v4(), Utc::now()))
        .await
        .unwrap()
        .unwrap();
    assert!(repo.delete_frozen(account.id).await.unwrap());
    assert!(matches!(
        repo.get_by_id(account.id).await.unwrap_err(),
        TundraError::NotFound { .. }
    ));
}

#[tokio::test]
async fn list_accounts_with_pagination() {
    let repo = setup().await;
    for i in 0..5 {
        repo.create(new_account(&format!("user{i}@example.com"), Role::User))
            .await
            .unwrap();
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);

    let rest = repo
        .list(Pagination {
            offset: 4,
            limit: 10,
        })
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
}
