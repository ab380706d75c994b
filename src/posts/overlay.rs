//! Per-identity visibility overlay.
//!
//! A device-local set of post ids hidden from view. No server state is
//! involved: the set is a UX overlay that survives reloads, and switching
//! identity on the same device switches to a disjoint bucket. There is no
//! unhide flow; the set grows monotonically under normal use.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::api::models::Post;
use crate::constants::{ANONYMOUS_BUCKET, HIDDEN_POSTS_PREFIX};
use crate::session::IdentityKey;
use crate::storage::KeyValueStore;

/// Hidden-post overlay for one identity.
#[derive(Clone)]
pub struct VisibilityOverlay {
    store: Arc<dyn KeyValueStore>,
    bucket_key: String,
}

impl VisibilityOverlay {
    /// Create an overlay scoped to the given identity, or to the anonymous
    /// bucket when the identity is unresolved.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, identity: Option<&IdentityKey>) -> Self {
        let bucket = identity.map_or(ANONYMOUS_BUCKET, IdentityKey::as_str);
        Self {
            store,
            bucket_key: format!("{HIDDEN_POSTS_PREFIX}{bucket}"),
        }
    }

    /// The set of hidden post ids. Missing or corrupt data yields an empty
    /// set, never an error.
    #[must_use]
    pub fn hidden(&self) -> HashSet<i64> {
        self.store
            .get(&self.bucket_key)
            .and_then(|raw| serde_json::from_str::<Vec<i64>>(&raw).ok())
            .map(HashSet::from_iter)
            .unwrap_or_default()
    }

    /// Hide a post id. Idempotent; persists immediately.
    pub fn mark_hidden(&self, post_id: i64) {
        let mut hidden = self.hidden();
        if hidden.insert(post_id) {
            let mut ids: Vec<i64> = hidden.into_iter().collect();
            ids.sort_unstable();
            if let Ok(raw) = serde_json::to_string(&ids) {
                self.store.set(&self.bucket_key, &raw);
            }
            debug!(post_id, bucket = %self.bucket_key, "Post hidden locally");
        }
    }

    /// Whether a post id is hidden in this bucket.
    #[must_use]
    pub fn is_hidden(&self, post_id: i64) -> bool {
        self.hidden().contains(&post_id)
    }

    /// Drop hidden posts from a list.
    #[must_use]
    pub fn filter(&self, posts: Vec<Post>) -> Vec<Post> {
        let hidden = self.hidden();
        if hidden.is_empty() {
            return posts;
        }
        posts
            .into_iter()
            .filter(|post| !hidden.contains(&post.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn overlay_for(identity: Option<&str>) -> (Arc<MemoryStore>, VisibilityOverlay) {
        let store = Arc::new(MemoryStore::new());
        let identity = identity.and_then(IdentityKey::new);
        let overlay = VisibilityOverlay::new(store.clone(), identity.as_ref());
        (store, overlay)
    }

    fn posts(ids: &[i64]) -> Vec<Post> {
        ids.iter()
            .map(|&id| Post { id, ..Post::default() })
            .collect()
    }

    #[test]
    fn test_empty_and_corrupt_buckets() {
        let (store, overlay) = overlay_for(Some("alice"));
        assert!(overlay.hidden().is_empty());

        store.set("hidden_posts_alice", "{definitely not json");
        assert!(overlay.hidden().is_empty());
    }

    #[test]
    fn test_mark_hidden_is_idempotent() {
        let (_store, overlay) = overlay_for(Some("alice"));
        let before = overlay.hidden().len();

        overlay.mark_hidden(5);
        overlay.mark_hidden(5);
        assert_eq!(overlay.hidden().len(), before + 1);
        assert!(overlay.is_hidden(5));
    }

    #[test]
    fn test_filter_excludes_hidden_and_is_idempotent() {
        let (_store, overlay) = overlay_for(Some("alice"));
        overlay.mark_hidden(2);
        overlay.mark_hidden(4);

        let filtered = overlay.filter(posts(&[1, 2, 3, 4, 5]));
        let ids: Vec<i64> = filtered.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);

        let twice = overlay.filter(filtered.clone());
        assert_eq!(
            twice.iter().map(|p| p.id).collect::<Vec<_>>(),
            filtered.iter().map(|p| p.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_buckets_are_disjoint_per_identity() {
        let store = Arc::new(MemoryStore::new());
        let alice = IdentityKey::new("alice");
        let bob = IdentityKey::new("bob");

        let alice_overlay = VisibilityOverlay::new(store.clone(), alice.as_ref());
        let bob_overlay = VisibilityOverlay::new(store.clone(), bob.as_ref());
        let anon_overlay = VisibilityOverlay::new(store, None);

        alice_overlay.mark_hidden(1);
        assert!(alice_overlay.is_hidden(1));
        assert!(!bob_overlay.is_hidden(1));
        assert!(!anon_overlay.is_hidden(1));

        anon_overlay.mark_hidden(2);
        assert!(!alice_overlay.is_hidden(2));
        assert!(anon_overlay.is_hidden(2));
    }

    #[test]
    fn test_bucket_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let identity = IdentityKey::new("alice");

        {
            let store = Arc::new(crate::storage::FileStore::open(&path));
            let overlay = VisibilityOverlay::new(store, identity.as_ref());
            overlay.mark_hidden(9);
        }

        let store = Arc::new(crate::storage::FileStore::open(&path));
        let overlay = VisibilityOverlay::new(store, identity.as_ref());
        assert!(overlay.is_hidden(9));
    }
}
