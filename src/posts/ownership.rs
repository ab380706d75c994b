//! Ownership resolution over inconsistently shaped post records.
//!
//! Different endpoints (and backend versions) identify a post's owner with
//! different fields, so ownership is decided by probing an ordered list of
//! candidate extractors rather than trusting any single field. Absent
//! fields are simply "no match".

use serde_json::Value;

use crate::api::models::Post;
use crate::session::IdentityKey;

type Extractor = fn(&Post) -> Option<String>;

/// Candidate owner fields, probed in order. First match wins.
const OWNER_FIELDS: &[(&str, Extractor)] = &[
    ("username", |p| p.username.clone()),
    ("author", |p| p.author.clone()),
    ("user_id", |p| p.user_id.as_ref().and_then(value_string)),
    ("creator", |p| p.creator.clone()),
    ("owner", |p| p.owner.clone()),
    ("user.id", |p| nested_user_field(p, "id")),
    ("user.username", |p| nested_user_field(p, "username")),
];

/// Decide whether `identity` owns `post`.
///
/// Comparisons are trimmed and case-insensitive. A `None` identity never
/// owns anything. As a last resort for malformed backends, a numeric
/// identity equal to the post id counts as ownership.
#[must_use]
pub fn is_owner(post: &Post, identity: Option<&IdentityKey>) -> bool {
    let Some(identity) = identity else {
        return false;
    };
    let wanted = identity.as_str();

    for (field, extract) in OWNER_FIELDS {
        if let Some(value) = extract(post) {
            // Identity keys are Unicode case-folded, so the record side
            // must be folded the same way.
            if value.trim().to_lowercase() == wanted {
                tracing::debug!(post_id = post.id, field = *field, "Ownership match");
                return true;
            }
        }
    }

    // Some broken record shapes put the owner's numeric id in `post.id`.
    if let Ok(numeric_identity) = wanted.parse::<i64>() {
        if numeric_identity == post.id {
            tracing::debug!(post_id = post.id, "Ownership match on numeric id");
            return true;
        }
    }

    false
}

fn nested_user_field(post: &Post, field: &str) -> Option<String> {
    post.user
        .as_ref()
        .and_then(|user| user.get(field))
        .and_then(value_string)
}

/// Stringify a JSON string or number for comparison.
fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
