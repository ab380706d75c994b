//! Wire types for the recipe-sharing API.
//!
//! The backend's record shapes are not entirely consistent between
//! endpoints (feed, per-user posts and search all return slightly different
//! post objects), so the owner-identifying fields are all optional and the
//! nested `user` object is kept as raw JSON for the ownership resolver's
//! duck-typed lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Credential pair returned by the token-issuance endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Response of the token-refresh endpoint. Some deployments rotate the
/// refresh token as well; when present, the rotated token replaces the
/// stored one.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// A comment on a post.
///
/// Client-minted ids (epoch milliseconds) are provisional until the server
/// assigns a real one; see the optimistic coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub username: String,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A post (recipe) record as returned by feed, profile and search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Post {
    pub id: i64,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub liked_by_user: bool,
    #[serde(default)]
    pub comments_count: i64,
    #[serde(default)]
    pub comments: Vec<Comment>,

    // Owner-identifying candidates; which of these is populated varies by
    // endpoint and backend version.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
}

/// Profile record from the user-data endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub follower_count: i64,
    #[serde(default)]
    pub following_count: i64,
}

/// Entry in a followers list or a user-search result.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSummary {
    pub username: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// Request body for account registration.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Request body for creating a post. `caption` carries the encoded recipe
/// payload; `image` is a reference produced by the (out of scope) upload
/// transport.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePostRequest {
    pub caption: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Response of the follow-toggle endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FollowResponse {
    #[serde(default)]
    pub following: bool,
}

/// Response of the like-toggle endpoint. Fields are optional because older
/// backend versions return only a message.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LikeResponse {
    #[serde(default)]
    pub liked: Option<bool>,
    #[serde(default)]
    pub likes_count: Option<i64>,
}

/// Response of the comment-create endpoint. `id` is the server-assigned
/// comment id when the backend returns the created record.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CommentResponse {
    #[serde(default)]
    pub id: Option<i64>,
}
