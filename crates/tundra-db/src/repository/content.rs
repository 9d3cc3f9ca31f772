//! SurrealDB implementation of [`ContentRepository`].
//!
//! The cascade writes are one bulk `UPDATE` per collection, guarded by
//! "not already in the target state" so a rerun only touches items a
//! previous, interrupted run missed.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tundra_core::error::TundraResult;
use tundra_core::models::content::{
    Comment, ContentKind, CreateComment, CreatePost, Post, Visibility,
};
use tundra_core::models::freeze::FreezeRecord;
use tundra_core::repository::{ContentRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use super::{CountRow, decode_freeze, parse_optional_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PostRow {
    owner_id: String,
    body: String,
    visibility: String,
    audience: Vec<String>,
    allow_comments: bool,
    frozen_at: Option<DateTime<Utc>>,
    frozen_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct PostRowWithId {
    record_id: String,
    owner_id: String,
    body: String,
    visibility: String,
    audience: Vec<String>,
    allow_comments: bool,
    frozen_at: Option<DateTime<Utc>>,
    frozen_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CommentRow {
    owner_id: String,
    post_id: String,
    reply_to: Option<String>,
    body: String,
    frozen_at: Option<DateTime<Utc>>,
    frozen_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CommentRowWithId {
    record_id: String,
    owner_id: String,
    post_id: String,
    reply_to: Option<String>,
    body: String,
    frozen_at: Option<DateTime<Utc>>,
    frozen_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Projection returned by the cascade's bulk updates.
#[derive(Debug, SurrealValue)]
struct MirrorRow {
    #[allow(dead_code)]
    owner_id: String,
}

fn parse_visibility(s: &str) -> Result<Visibility, DbError> {
    match s {
        "Public" => Ok(Visibility::Public),
        "Audience" => Ok(Visibility::Audience),
        "OnlyMe" => Ok(Visibility::OnlyMe),
        other => Err(DbError::Corrupt(format!("unknown visibility: {other}"))),
    }
}

fn visibility_to_string(v: Visibility) -> &'static str {
    match v {
        Visibility::Public => "Public",
        Visibility::Audience => "Audience",
        Visibility::OnlyMe => "OnlyMe",
    }
}

impl PostRow {
    fn into_post(self, id: Uuid) -> Result<Post, DbError> {
        let audience = self
            .audience
            .iter()
            .map(|a| parse_uuid(a, "audience"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Post {
            id,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            body: self.body,
            visibility: parse_visibility(&self.visibility)?,
            audience,
            allow_comments: self.allow_comments,
            freeze: decode_freeze(self.frozen_at, self.frozen_by, &format!("post:{id}"))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PostRowWithId {
    fn try_into_post(self) -> Result<Post, DbError> {
        let id = parse_uuid(&self.record_id, "post")?;
        PostRow {
            owner_id: self.owner_id,
            body: self.body,
            visibility: self.visibility,
            audience: self.audience,
            allow_comments: self.allow_comments,
            frozen_at: self.frozen_at,
            frozen_by: self.frozen_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_post(id)
    }
}

impl CommentRow {
    fn into_comment(self, id: Uuid) -> Result<Comment, DbError> {
        Ok(Comment {
            id,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            post_id: parse_uuid(&self.post_id, "post")?,
            reply_to: parse_optional_uuid(self.reply_to, "reply_to")?,
            body: self.body,
            freeze: decode_freeze(self.frozen_at, self.frozen_by, &format!("comment:{id}"))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl CommentRowWithId {
    fn try_into_comment(self) -> Result<Comment, DbError> {
        let id = parse_uuid(&self.record_id, "comment")?;
        CommentRow {
            owner_id: self.owner_id,
            post_id: self.post_id,
            reply_to: self.reply_to,
            body: self.body,
            frozen_at: self.frozen_at,
            frozen_by: self.frozen_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_comment(id)
    }
}

/// SurrealDB implementation of the Content repository.
#[derive(Clone)]
pub struct SurrealContentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealContentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn bulk_update(&self, query: String, bindings: Bindings) -> Result<u64, DbError> {
        let mut builder = self
            .db
            .query(&query)
            .bind(("owner_id", bindings.owner_id.to_string()));
        if let Some(record) = bindings.freeze {
            builder = builder
                .bind(("frozen_at", record.frozen_at))
                .bind(("frozen_by", record.frozen_by.to_string()));
        }

        let result = builder.await?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<MirrorRow> = result.take(0)?;
        Ok(rows.len() as u64)
    }
}

struct Bindings {
    owner_id: Uuid,
    freeze: Option<FreezeRecord>,
}

impl<C: Connection> ContentRepository for SurrealContentRepository<C> {
    async fn create_post(&self, input: CreatePost) -> TundraResult<Post> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let audience: Vec<String> = input.audience.iter().map(Uuid::to_string).collect();

        let result = self
            .db
            .query(
                "CREATE type::record('post', $id) SET \
                 owner_id = $owner_id, \
                 body = $body, \
                 visibility = $visibility, \
                 audience = $audience, \
                 allow_comments = $allow_comments",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("body", input.body))
            .bind(("visibility", visibility_to_string(input.visibility).to_string()))
            .bind(("audience", audience))
            .bind(("allow_comments", input.allow_comments))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<PostRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "post".into(),
            id: id_str,
        })?;

        Ok(row.into_post(id)?)
    }

    async fn get_post(&self, id: Uuid) -> TundraResult<Post> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('post', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PostRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "post".into(),
            id: id_str,
        })?;

        Ok(row.into_post(id)?)
    }

    async fn list_posts(&self, pagination: Pagination) -> TundraResult<PaginatedResult<Post>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM post GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM post \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PostRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(PostRowWithId::try_into_post)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_posts_by_owner(&self, owner_id: Uuid) -> TundraResult<Vec<Post>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM post \
                 WHERE owner_id = $owner_id ORDER BY created_at ASC",
            )
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PostRowWithId> = result.take(0).map_err(DbError::from)?;
        let posts = rows
            .into_iter()
            .map(PostRowWithId::try_into_post)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(posts)
    }

    async fn create_comment(&self, input: CreateComment) -> TundraResult<Comment> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('comment', $id) SET \
                 owner_id = $owner_id, \
                 post_id = $post_id, \
                 reply_to = $reply_to, \
                 body = $body",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("post_id", input.post_id.to_string()))
            .bind(("reply_to", input.reply_to.map(|r| r.to_string())))
            .bind(("body", input.body))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<CommentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "comment".into(),
            id: id_str,
        })?;

        Ok(row.into_comment(id)?)
    }

    async fn get_comment(&self, id: Uuid) -> TundraResult<Comment> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('comment', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CommentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "comment".into(),
            id: id_str,
        })?;

        Ok(row.into_comment(id)?)
    }

    async fn list_comments_by_owner(&self, owner_id: Uuid) -> TundraResult<Vec<Comment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM comment \
                 WHERE owner_id = $owner_id ORDER BY created_at ASC",
            )
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CommentRowWithId> = result.take(0).map_err(DbError::from)?;
        let comments = rows
            .into_iter()
            .map(CommentRowWithId::try_into_comment)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(comments)
    }

    async fn freeze_owned(
        &self,
        kind: ContentKind,
        owner_id: Uuid,
        record: FreezeRecord,
    ) -> TundraResult<u64> {
        let query = format!(
            "UPDATE {} SET \
             frozen_at = $frozen_at, \
             frozen_by = $frozen_by, \
             updated_at = time::now() \
             WHERE owner_id = $owner_id \
             AND (frozen_at IS NONE OR frozen_by != $frozen_by OR frozen_at != $frozen_at) \
             RETURN owner_id",
            kind.table()
        );
        let bindings = Bindings {
            owner_id,
            freeze: Some(record),
        };
        Ok(self.bulk_update(query, bindings).await?)
    }

    async fn unfreeze_owned(&self, kind: ContentKind, owner_id: Uuid) -> TundraResult<u64> {
        let query = format!(
            "UPDATE {} SET \
             frozen_at = NONE, \
             frozen_by = NONE, \
             updated_at = time::now() \
             WHERE owner_id = $owner_id AND frozen_at IS NOT NONE \
             RETURN owner_id",
            kind.table()
        );
        let bindings = Bindings {
            owner_id,
            freeze: None,
        };
        Ok(self.bulk_update(query, bindings).await?)
    }

    async fn delete_comments_on_owned_posts(&self, owner_id: Uuid) -> TundraResult<u64> {
        let owner = owner_id.to_string();
        let owned_posts = "SELECT VALUE meta::id(id) FROM post WHERE owner_id = $owner_id";

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM comment \
                 WHERE post_id IN ({owned_posts}) GROUP ALL"
            ))
            .bind(("owner_id", owner.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query(format!("DELETE comment WHERE post_id IN ({owned_posts})"))
            .bind(("owner_id", owner))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(total)
    }

    async fn delete_owned(&self, kind: ContentKind, owner_id: Uuid) -> TundraResult<u64> {
        let table = kind.table();
        let owner = owner_id.to_string();

        // Count first, then delete.
        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM {table} WHERE owner_id = $owner_id GROUP ALL"
            ))
            .bind(("owner_id", owner.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query(format!("DELETE {table} WHERE owner_id = $owner_id"))
            .bind(("owner_id", owner))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(total)
    }
}
