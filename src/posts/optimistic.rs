//! Optimistic like/comment mutations with rollback.
//!
//! Each mutation is split into a pure local state transition that returns
//! an undo value, and an async coordinator that issues the remote call and
//! applies the undo on failure. The split keeps the rollback law testable
//! without a network: undoing always restores the exact pre-flip values.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use tracing::{debug, warn};

use crate::api::models::{Comment, Post};
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::session::IdentityKey;

/// Undo value for a like toggle: the exact pre-flip pair.
#[derive(Debug, Clone, Copy)]
pub struct LikeUndo {
    liked_before: bool,
    likes_before: i64,
}

impl LikeUndo {
    /// Restore the pre-flip state.
    pub fn undo(self, post: &mut Post) {
        post.liked_by_user = self.liked_before;
        post.likes_count = self.likes_before;
    }
}

/// Flip the local like state and adjust the count, returning the undo.
///
/// The count is floored at zero so a server record claiming
/// `liked_by_user` with a zero count cannot push it negative; the undo
/// still restores the observed pre-flip pair exactly.
#[must_use]
pub fn apply_like_toggle(post: &mut Post) -> LikeUndo {
    let undo = LikeUndo {
        liked_before: post.liked_by_user,
        likes_before: post.likes_count,
    };
    if post.liked_by_user {
        post.likes_count = (post.likes_count - 1).max(0);
    } else {
        post.likes_count += 1;
    }
    post.liked_by_user = !post.liked_by_user;
    undo
}

/// Handle to one provisional comment. Each submission carries its own id,
/// so concurrent submissions reconcile and roll back independently.
#[derive(Debug, Clone, Copy)]
pub struct ProvisionalComment {
    id: i64,
}

impl ProvisionalComment {
    #[must_use]
    pub fn id(self) -> i64 {
        self.id
    }

    /// Swap the client-minted id for the server-assigned one, when the
    /// server returned it.
    pub fn reconcile(self, post: &mut Post, server_id: Option<i64>) {
        if let Some(server_id) = server_id {
            if let Some(comment) = post.comments.iter_mut().find(|c| c.id == self.id) {
                comment.id = server_id;
            }
        }
    }

    /// Remove this provisional comment and decrement the count. Touches
    /// only the comment with this handle's id.
    pub fn rollback(self, post: &mut Post) {
        let before = post.comments.len();
        post.comments.retain(|c| c.id != self.id);
        if post.comments.len() < before {
            post.comments_count -= 1;
        }
    }
}

/// Mint a provisional comment id: a monotonic clock value, bumped past the
/// previous one so rapid submissions never collide.
fn next_provisional_id() -> i64 {
    static LAST: AtomicI64 = AtomicI64::new(0);
    let now = Utc::now().timestamp_millis();
    LAST.fetch_max(now, Ordering::Relaxed);
    LAST.fetch_add(1, Ordering::Relaxed)
}

/// Append a provisional comment and bump the count, returning the handle.
#[must_use]
pub fn apply_provisional_comment(
    post: &mut Post,
    text: &str,
    author: Option<&IdentityKey>,
) -> ProvisionalComment {
    let id = next_provisional_id();
    post.comments.push(Comment {
        id,
        username: author.map(ToString::to_string).unwrap_or_default(),
        text: text.to_string(),
        created_at: Some(Utc::now()),
    });
    post.comments_count += 1;
    ProvisionalComment { id }
}

/// Issues like/comment mutations with optimistic local state.
#[derive(Clone)]
pub struct MutationCoordinator {
    api: ApiClient,
}

impl MutationCoordinator {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Toggle a like: flip locally, call the server, roll back on failure.
    ///
    /// The flip is computed from the post's current state, so two rapid
    /// toggles through the same `&mut Post` serialize correctly.
    ///
    /// # Errors
    ///
    /// Returns the API error after restoring the pre-flip state.
    pub async fn toggle_like(&self, token: &str, post: &mut Post) -> Result<(), ApiError> {
        let undo = apply_like_toggle(post);
        match self.api.toggle_like(token, post.id).await {
            Ok(response) => {
                // Adopt authoritative values when the server reports them.
                if let Some(liked) = response.liked {
                    post.liked_by_user = liked;
                }
                if let Some(count) = response.likes_count {
                    post.likes_count = count.max(0);
                }
                Ok(())
            }
            Err(e) => {
                warn!(post_id = post.id, error = %e, "Like toggle failed, rolling back");
                undo.undo(post);
                Err(e)
            }
        }
    }

    /// Submit a comment: append provisionally, call the server, reconcile
    /// the id on success or remove the provisional comment on failure.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for empty text, or the API error
    /// after rolling back the provisional comment.
    pub async fn submit_comment(
        &self,
        token: &str,
        post: &mut Post,
        text: &str,
        author: Option<&IdentityKey>,
    ) -> Result<(), ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::Validation(
                "comment text cannot be empty".to_string(),
            ));
        }

        let provisional = apply_provisional_comment(post, text, author);
        match self.api.create_comment(token, post.id, text).await {
            Ok(response) => {
                debug!(post_id = post.id, server_id = ?response.id, "Comment created");
                provisional.reconcile(post, response.id);
                Ok(())
            }
            Err(e) => {
                warn!(post_id = post.id, error = %e, "Comment failed, removing provisional");
                provisional.rollback(post);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(liked: bool, likes: i64) -> Post {
        Post {
            id: 1,
            liked_by_user: liked,
            likes_count: likes,
            ..Post::default()
        }
    }

    #[test]
    fn test_like_toggle_and_rollback_law() {
        for (liked, likes) in [(false, 0), (false, 7), (true, 1), (true, 0)] {
            let mut p = post(liked, likes);
            let undo = apply_like_toggle(&mut p);

            assert_eq!(p.liked_by_user, !liked);
            assert!(p.likes_count >= 0);

            undo.undo(&mut p);
            assert_eq!(p.liked_by_user, liked);
            assert_eq!(p.likes_count, likes);
        }
    }

    #[test]
    fn test_rapid_toggles_use_latest_state() {
        let mut p = post(false, 3);
        apply_like_toggle(&mut p);
        assert_eq!((p.liked_by_user, p.likes_count), (true, 4));
        apply_like_toggle(&mut p);
        assert_eq!((p.liked_by_user, p.likes_count), (false, 3));
    }

    #[test]
    fn test_unlike_floors_at_zero() {
        let mut p = post(true, 0);
        let undo = apply_like_toggle(&mut p);
        assert_eq!(p.likes_count, 0);
        undo.undo(&mut p);
        assert_eq!((p.liked_by_user, p.likes_count), (true, 0));
    }

    #[test]
    fn test_provisional_comment_append_and_rollback() {
        let mut p = post(false, 0);
        let author = IdentityKey::new("alice");

        let handle = apply_provisional_comment(&mut p, "tasty", author.as_ref());
        assert_eq!(p.comments.len(), 1);
        assert_eq!(p.comments_count, 1);
        assert_eq!(p.comments[0].text, "tasty");
        assert_eq!(p.comments[0].username, "alice");

        handle.rollback(&mut p);
        assert!(p.comments.is_empty());
        assert_eq!(p.comments_count, 0);
    }

    #[test]
    fn test_concurrent_provisional_comments_are_independent() {
        let mut p = post(false, 0);
        let first = apply_provisional_comment(&mut p, "one", None);
        let second = apply_provisional_comment(&mut p, "two", None);
        assert_ne!(first.id(), second.id());

        // Failing the first submission must not touch the second.
        first.rollback(&mut p);
        assert_eq!(p.comments.len(), 1);
        assert_eq!(p.comments[0].text, "two");
        assert_eq!(p.comments_count, 1);
    }

    #[test]
    fn test_reconcile_replaces_provisional_id() {
        let mut p = post(false, 0);
        let handle = apply_provisional_comment(&mut p, "hello", None);

        handle.reconcile(&mut p, Some(555));
        assert_eq!(p.comments[0].id, 555);

        // No server id: the provisional id stands.
        let second = apply_provisional_comment(&mut p, "again", None);
        let provisional_id = second.id();
        second.reconcile(&mut p, None);
        assert_eq!(p.comments[1].id, provisional_id);
    }

    #[test]
    fn test_provisional_ids_monotonic() {
        let a = next_provisional_id();
        let b = next_provisional_id();
        assert!(b > a);
    }
}
