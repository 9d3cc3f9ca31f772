//! Content visibility resolver.
//!
//! Pure predicates over a post and a viewer. The listing path and the
//! comment-creation path both go through [`VisibilityResolver`], so a
//! post can never be readable on one path and hidden on the other.

use uuid::Uuid;

use crate::models::content::{Post, Visibility};

/// Stateless visibility rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityResolver;

impl VisibilityResolver {
    pub fn new() -> Self {
        Self
    }

    /// Public, owned by the viewer, or the viewer is in the audience.
    pub fn is_visible(&self, viewer: Option<Uuid>, post: &Post) -> bool {
        if post.visibility == Visibility::Public {
            return true;
        }
        let Some(viewer) = viewer else {
            return false;
        };
        if post.owner_id == viewer {
            return true;
        }
        post.visibility == Visibility::Audience && post.audience.contains(&viewer)
    }

    /// Visible, open for comments, and the owner is not frozen unless the
    /// viewer is the owner.
    ///
    /// `owner_frozen` must come from the owner's account record, not from
    /// the post's freeze mirror, which may lag behind during a cascade.
    pub fn can_comment(&self, viewer: Uuid, post: &Post, owner_frozen: bool) -> bool {
        self.is_visible(Some(viewer), post)
            && post.allow_comments
            && (!owner_frozen || post.owner_id == viewer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(owner: Uuid, visibility: Visibility, audience: Vec<Uuid>) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            owner_id: owner,
            body: "hello".into(),
            visibility,
            audience,
            allow_comments: true,
            freeze: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn public_posts_are_visible_to_everyone() {
        let resolver = VisibilityResolver::new();
        let p = post(Uuid::new_v4(), Visibility::Public, vec![]);
        assert!(resolver.is_visible(None, &p));
        assert!(resolver.is_visible(Some(Uuid::new_v4()), &p));
    }

    #[test]
    fn audience_posts_need_membership() {
        let resolver = VisibilityResolver::new();
        let friend = Uuid::new_v4();
        let p = post(Uuid::new_v4(), Visibility::Audience, vec![friend]);
        assert!(resolver.is_visible(Some(friend), &p));
        assert!(!resolver.is_visible(Some(Uuid::new_v4()), &p));
        assert!(!resolver.is_visible(None, &p));
    }

    #[test]
    fn only_me_ignores_audience() {
        let resolver = VisibilityResolver::new();
        let owner = Uuid::new_v4();
        let listed = Uuid::new_v4();
        let p = post(owner, Visibility::OnlyMe, vec![listed]);
        assert!(resolver.is_visible(Some(owner), &p));
        assert!(!resolver.is_visible(Some(listed), &p));
    }

    #[test]
    fn frozen_owner_blocks_comments_from_others() {
        let resolver = VisibilityResolver::new();
        let owner = Uuid::new_v4();
        let p = post(owner, Visibility::Public, vec![]);
        assert!(resolver.can_comment(Uuid::new_v4(), &p, false));
        assert!(!resolver.can_comment(Uuid::new_v4(), &p, true));
        assert!(resolver.can_comment(owner, &p, true));
        // Still readable while frozen.
        assert!(resolver.is_visible(Some(Uuid::new_v4()), &p));
    }

    #[test]
    fn closed_posts_reject_comments() {
        let resolver = VisibilityResolver::new();
        let owner = Uuid::new_v4();
        let mut p = post(owner, Visibility::Public, vec![]);
        p.allow_comments = false;
        assert!(!resolver.can_comment(owner, &p, false));
    }

    #[test]
    fn invisible_posts_reject_comments() {
        let resolver = VisibilityResolver::new();
        let p = post(Uuid::new_v4(), Visibility::OnlyMe, vec![]);
        assert!(!resolver.can_comment(Uuid::new_v4(), &p, false));
    }
}
