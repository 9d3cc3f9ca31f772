//! Integration tests for post visibility and comment gating.

use chrono::Utc;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tundra_core::error::TundraError;
use tundra_core::models::account::{Account, CreateAccount, Role};
use tundra_core::models::content::{CreateComment, CreatePost, Post, Visibility};
use tundra_core::models::freeze::FreezeRecord;
use tundra_core::repository::{AccountRepository, ContentRepository, Pagination};
use tundra_db::repository::{SurrealAccountRepository, SurrealContentRepository};
use tundra_lifecycle::{ContentService, NewComment};
use uuid::Uuid;

type Service = ContentService<SurrealAccountRepository<Db>, SurrealContentRepository<Db>>;

struct Harness {
    service: Service,
    accounts: SurrealAccountRepository<Db>,
    content: SurrealContentRepository<Db>,
}

async fn setup() -> Harness {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tundra_db::run_migrations(&db).await.unwrap();

    Harness {
        service: ContentService::new(
            SurrealAccountRepository::new(db.clone()),
            SurrealContentRepository::new(db.clone()),
        ),
        accounts: SurrealAccountRepository::new(db.clone()),
        content: SurrealContentRepository::new(db),
    }
}

impl Harness {
    async fn account(&self, email: &str) -> Account {
        self.accounts
            .create(CreateAccount {
                email: email.into(),
                password_hash: "$argon2id$placeholder".into(),
                role: Role::User,
            })
            .await
            .unwrap()
    }

    async fn post(&self, owner: Uuid, visibility: Visibility, audience: Vec<Uuid>) -> Post {
        self.content
            .create_post(CreatePost {
                owner_id: owner,
                body: "hello".into(),
                visibility,
                audience,
                allow_comments: true,
            })
            .await
            .unwrap()
    }
}

fn text(body: &str) -> NewComment {
    NewComment {
        body: body.into(),
        reply_to: None,
    }
}

#[tokio::test]
async fn frozen_owner_post_rejects_comments_from_others() {
    let h = setup().await;
    let owner = h.account("owner@example.com").await;
    let viewer = h.account("viewer@example.com").await;
    let post = h.post(owner.id, Visibility::Public, Vec::new()).await;

    h.service
        .create_comment(viewer.id, post.id, text("before"))
        .await
        .unwrap();

    h.accounts
        .freeze(owner.id, FreezeRecord::new(owner.id, Utc::now()))
        .await
        .unwrap()
        .unwrap();

    let err = h
        .service
        .create_comment(viewer.id, post.id, text("after"))
        .await
        .unwrap_err();
    assert!(matches!(err, TundraError::NotFound { .. }));

    // The owner still can, and the post stays readable.
    h.service
        .create_comment(owner.id, post.id, text("mine"))
        .await
        .unwrap();
    assert!(h.service.get_post(Some(viewer.id), post.id).await.is_ok());
}

#[tokio::test]
async fn deleted_owner_post_rejects_comments() {
    let h = setup().await;
    let viewer = h.account("viewer@example.com").await;
    let post = h.post(Uuid::new_v4(), Visibility::Public, Vec::new()).await;

    let err = h
        .service
        .create_comment(viewer.id, post.id, text("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, TundraError::NotFound { .. }));
}

#[tokio::test]
async fn audience_post_is_visible_only_to_listed_viewers() {
    let h = setup().await;
    let owner = h.account("owner@example.com").await;
    let friend = h.account("friend@example.com").await;
    let stranger = h.account("stranger@example.com").await;
    let post = h.post(owner.id, Visibility::Audience, vec![friend.id]).await;

    assert!(h.service.get_post(Some(owner.id), post.id).await.is_ok());
    assert!(h.service.get_post(Some(friend.id), post.id).await.is_ok());
    assert!(matches!(
        h.service.get_post(Some(stranger.id), post.id).await.unwrap_err(),
        TundraError::NotFound { .. }
    ));
    assert!(h.service.get_post(None, post.id).await.is_err());

    h.service
        .create_comment(friend.id, post.id, text("hi"))
        .await
        .unwrap();
    let err = h
        .service
        .create_comment(stranger.id, post.id, text("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, TundraError::NotFound { .. }));
}

#[tokio::test]
async fn listing_filters_by_visibility() {
    let h = setup().await;
    let owner = h.account("owner@example.com").await;
    let friend = h.account("friend@example.com").await;
    h.post(owner.id, Visibility::Public, Vec::new()).await;
    h.post(owner.id, Visibility::Audience, vec![friend.id]).await;
    h.post(owner.id, Visibility::OnlyMe, Vec::new()).await;

    let page = Pagination::default();
    assert_eq!(h.service.visible_posts(None, page).await.unwrap().len(), 1);
    assert_eq!(
        h.service
            .visible_posts(Some(friend.id), page)
            .await
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        h.service
            .visible_posts(Some(owner.id), page)
            .await
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
async fn comments_disabled_on_post() {
    let h = setup().await;
    let owner = h.account("owner@example.com").await;
    let viewer = h.account("viewer@example.com").await;
    let post = h
        .content
        .create_post(CreatePost {
            owner_id: owner.id,
            body: "quiet".into(),
            visibility: Visibility::Public,
            audience: Vec::new(),
            allow_comments: false,
        })
        .await
        .unwrap();

    let err = h
        .service
        .create_comment(viewer.id, post.id, text("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, TundraError::NotFound { .. }));
}

#[tokio::test]
async fn reply_must_target_comment_on_same_post() {
    let h = setup().await;
    let owner = h.account("owner@example.com").await;
    let viewer = h.account("viewer@example.com").await;
    let post = h.post(owner.id, Visibility::Public, Vec::new()).await;
    let other_post = h.post(owner.id, Visibility::Public, Vec::new()).await;

    let parent = h
        .service
        .create_comment(viewer.id, post.id, text("parent"))
        .await
        .unwrap();
    let stray = h
        .content
        .create_comment(CreateComment {
            owner_id: owner.id,
            post_id: other_post.id,
            reply_to: None,
            body: "elsewhere".into(),
        })
        .await
        .unwrap();

    let reply = h
        .service
        .create_comment(
            owner.id,
            post.id,
            NewComment {
                body: "reply".into(),
                reply_to: Some(parent.id),
            },
        )
        .await
        .unwrap();
    assert_eq!(reply.reply_to, Some(parent.id));

    let err = h
        .service
        .create_comment(
            viewer.id,
            post.id,
            NewComment {
                body: "misplaced".into(),
                reply_to: Some(stray.id),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TundraError::NotFound { .. }));
}

#[tokio::test]
async fn empty_comment_is_rejected() {
    let h = setup().await;
    let owner = h.account("owner@example.com").await;
    let post = h.post(owner.id, Visibility::Public, Vec::new()).await;

    let err = h
        .service
        .create_comment(owner.id, post.id, text("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, TundraError::Validation { .. }));
}
