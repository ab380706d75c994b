//! Headless client for a social recipe-sharing service.
//!
//! Maintains authentication state locally (with silent token refresh),
//! encodes structured recipes inside free-text captions, resolves content
//! ownership across inconsistently shaped records, keeps a per-identity
//! local hidden-post overlay with a delete-endpoint fallback chain, and
//! applies optimistic like/comment mutations with rollback.

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod posts;
pub mod recipe;
pub mod session;
pub mod storage;
