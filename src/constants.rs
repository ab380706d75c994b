//! Shared constants used across the client.

/// Storage key for the short-lived access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the long-lived refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Prefix for the per-identity hidden-post buckets.
pub const HIDDEN_POSTS_PREFIX: &str = "hidden_posts_";

/// Bucket suffix used when no identity can be resolved from the credentials.
pub const ANONYMOUS_BUCKET: &str = "anonymous";

/// Candidate delete endpoints, probed in order by the hide coordinator.
///
/// The backend's delete contract is not guaranteed to exist, and when it does
/// its route shape is unknown, so every plausible plural/singular and
/// resource-first/verb-first arrangement is tried. `{id}` is replaced with
/// the post id.
pub const DELETE_ENDPOINT_TEMPLATES: &[&str] = &[
    "api/posts/delete/{id}/",
    "api/posts/{id}/delete/",
    "api/recipes/delete/{id}/",
    "api/recipes/{id}/delete/",
    "api/post/delete/{id}/",
    "api/recipe/delete/{id}/",
    "api/recipes/{id}/",
    "api/posts/{id}/",
];
