//! Unverified access-token payload decoding and identity resolution.
//!
//! The client only needs to read claims the server already signed (expiry
//! and the identity of the logged-in user); verification is the server's
//! job on every authenticated request. A malformed token therefore decodes
//! to `None` everywhere, which callers treat exactly like an absent token.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Claims the client cares about. Everything is optional; backends differ
/// in which identity claim they embed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
}

/// Normalized (trimmed, case-folded) identity of a user within this client
/// session. Derived from token claims, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Normalize a raw identity value. Returns `None` for empty or
    /// whitespace-only input.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decode the payload segment of a JWT without verifying its signature.
///
/// Returns `None` for anything that is not a well-formed three-segment
/// token with a JSON payload.
#[must_use]
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Read the expiry timestamp embedded in an access token.
#[must_use]
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let exp = decode_claims(token)?.exp?;
    Utc.timestamp_opt(exp, 0).single()
}

/// Resolve the stable identity key from an access token.
///
/// Claim fields are tried in fixed priority order: `username`, `user_id`,
/// `sub`, `id`. The first non-empty value wins. Absent or malformed tokens
/// resolve to `None`, never an error.
#[must_use]
pub fn resolve_identity(token: &str) -> Option<IdentityKey> {
    let claims = decode_claims(token)?;

    let candidates: [Option<String>; 4] = [
        claims.username,
        claims.user_id.as_ref().and_then(claim_string),
        claims.sub,
        claims.id.as_ref().and_then(claim_string),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|value| IdentityKey::new(&value))
}

/// Stringify a claim that may arrive as a JSON string or number.
fn claim_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_decode_malformed_tokens() {
        assert!(decode_claims("").is_none());
        assert!(decode_claims("not-a-jwt").is_none());
        assert!(decode_claims("a.!!!not-base64!!!.c").is_none());
        let bad_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode("[1, 2"));
        assert!(decode_claims(&bad_json).is_none());
    }

    #[test]
    fn test_expires_at() {
        let token = make_token(&serde_json::json!({ "exp": 1_700_000_000 }));
        let exp = expires_at(&token).unwrap();
        assert_eq!(exp.timestamp(), 1_700_000_000);

        let no_exp = make_token(&serde_json::json!({ "username": "alice" }));
        assert!(expires_at(&no_exp).is_none());
    }

    #[test]
    fn test_identity_priority_order() {
        let token = make_token(&serde_json::json!({
            "username": "Alice",
            "user_id": 42,
            "sub": "alice-sub",
        }));
        assert_eq!(resolve_identity(&token).unwrap().as_str(), "alice");

        let token = make_token(&serde_json::json!({ "user_id": 42, "sub": "alice-sub" }));
        assert_eq!(resolve_identity(&token).unwrap().as_str(), "42");

        let token = make_token(&serde_json::json!({ "sub": "Alice-Sub" }));
        assert_eq!(resolve_identity(&token).unwrap().as_str(), "alice-sub");

        let token = make_token(&serde_json::json!({ "id": "77" }));
        assert_eq!(resolve_identity(&token).unwrap().as_str(), "77");
    }

    #[test]
    fn test_identity_skips_empty_claims() {
        let token = make_token(&serde_json::json!({ "username": "   ", "user_id": "bob" }));
        assert_eq!(resolve_identity(&token).unwrap().as_str(), "bob");
    }

    #[test]
    fn test_identity_none_when_no_claims_match() {
        let token = make_token(&serde_json::json!({ "role": "admin" }));
        assert!(resolve_identity(&token).is_none());
        assert!(resolve_identity("garbage").is_none());
    }

    #[test]
    fn test_identity_key_normalization() {
        assert_eq!(IdentityKey::new("  ALICE ").unwrap().as_str(), "alice");
        assert!(IdentityKey::new("").is_none());
        assert!(IdentityKey::new("   ").is_none());
    }
}
