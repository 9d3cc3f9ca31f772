//! Content gate — post reads and comment creation, both decided by the
//! same [`VisibilityResolver`].

use tracing::debug;
use tundra_core::error::{TundraError, TundraResult};
use tundra_core::models::content::{Comment, CreateComment, Post};
use tundra_core::repository::{AccountRepository, ContentRepository, Pagination};
use tundra_core::visibility::VisibilityResolver;
use uuid::Uuid;

/// Input for a new comment or reply.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub body: String,
    /// Parent comment on the same post, for replies.
    pub reply_to: Option<Uuid>,
}

pub struct ContentService<A: AccountRepository, C: ContentRepository> {
    accounts: A,
    content: C,
    resolver: VisibilityResolver,
}

impl<A: AccountRepository, C: ContentRepository> ContentService<A, C> {
    pub fn new(accounts: A, content: C) -> Self {
        Self {
            accounts,
            content,
            resolver: VisibilityResolver::new(),
        }
    }

    /// A single post, or `NotFound` if the viewer may not see it.
    pub async fn get_post(&self, viewer: Option<Uuid>, post_id: Uuid) -> TundraResult<Post> {
        let post = self.content.get_post(post_id).await?;
        if !self.resolver.is_visible(viewer, &post) {
            return Err(TundraError::not_found("post", post_id));
        }
        Ok(post)
    }

    /// One page of posts, keeping only those visible to `viewer`.
    pub async fn visible_posts(
        &self,
        viewer: Option<Uuid>,
        pagination: Pagination,
    ) -> TundraResult<Vec<Post>> {
        let page = self.content.list_posts(pagination).await?;
        Ok(page
            .items
            .into_iter()
            .filter(|post| self.resolver.is_visible(viewer, post))
            .collect())
    }

    /// Comment on `post_id` as `viewer`.
    ///
    /// A post the viewer cannot comment on is reported as missing. The
    /// owner's frozen state is read from the account record rather than
    /// the post's mirror fields.
    pub async fn create_comment(
        &self,
        viewer: Uuid,
        post_id: Uuid,
        input: NewComment,
    ) -> TundraResult<Comment> {
        if input.body.trim().is_empty() {
            return Err(TundraError::Validation {
                message: "comment body must not be empty".into(),
            });
        }

        let post = self.content.get_post(post_id).await?;
        let owner_frozen = match self.accounts.get_by_id(post.owner_id).await {
            Ok(owner) => owner.is_frozen(),
            // Owner already deleted; its content is on the way out.
            Err(TundraError::NotFound { .. }) => true,
            Err(e) => return Err(e),
        };

        if !self.resolver.can_comment(viewer, &post, owner_frozen) {
            debug!(
                viewer = %viewer,
                post_id = %post_id,
                owner_frozen,
                "Comment rejected by visibility"
            );
            return Err(TundraError::not_found("post", post_id));
        }

        if let Some(parent_id) = input.reply_to {
            let parent = self.content.get_comment(parent_id).await?;
            if parent.post_id != post_id {
                return Err(TundraError::not_found("comment", parent_id));
            }
        }

        self.content
            .create_comment(CreateComment {
                owner_id: viewer,
                post_id,
                reply_to: input.reply_to,
                body: input.body,
            })
            .await
    }
}
