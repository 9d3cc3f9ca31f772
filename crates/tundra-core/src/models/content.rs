//! Post and comment domain models.
//!
//! Both carry freeze mirror fields that only the cascade writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::freeze::FreezeRecord;

/// The collections a cascade fans out over.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Post,
    Comment,
}

impl ContentKind {
    pub const ALL: [ContentKind; 2] = [ContentKind::Post, ContentKind::Comment];

    pub fn table(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Visibility {
    /// Anyone may see it.
    Public,
    /// Only the owner and the listed audience.
    Audience,
    /// Only the owner.
    OnlyMe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub body: String,
    pub visibility: Visibility,
    pub audience: Vec<Uuid>,
    pub allow_comments: bool,
    pub freeze: Option<FreezeRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePost {
    pub owner_id: Uuid,
    pub body: String,
    pub visibility: Visibility,
    pub audience: Vec<Uuid>,
    pub allow_comments: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub post_id: Uuid,
    /// Parent comment when this is a reply.
    pub reply_to: Option<Uuid>,
    pub body: String,
    pub freeze: Option<FreezeRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub owner_id: Uuid,
    pub post_id: Uuid,
    pub reply_to: Option<Uuid>,
    pub body: String,
}
