//! Authentication state: credential persistence and the session lifecycle.
//!
//! The lifecycle is a small state machine:
//!
//! ```text
//! Unknown -> { Authenticated, Unauthenticated }
//! Authenticated -> Expired -> { Refreshing -> Authenticated | Unauthenticated }
//! ```
//!
//! [`SessionManager::check_status`] drives it without a server round-trip
//! unless the access token has expired, in which case exactly one silent
//! refresh is attempted. Callers gate protected views on the returned
//! status; anything that is not `Authenticated` means "go log in".

pub mod claims;

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::api::models::TokenPair;
use crate::api::ApiClient;
use crate::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::error::ApiError;
use crate::storage::KeyValueStore;

pub use claims::{decode_claims, expires_at, resolve_identity, IdentityKey, TokenClaims};

/// Persisted access/refresh credential pair, scoped to the device.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    /// Store a full credential pair (login).
    pub fn store_pair(&self, pair: &TokenPair) {
        self.store.set(ACCESS_TOKEN_KEY, &pair.access);
        self.store.set(REFRESH_TOKEN_KEY, &pair.refresh);
    }

    /// Replace only the access token (refresh).
    pub fn store_access(&self, access: &str) {
        self.store.set(ACCESS_TOKEN_KEY, access);
    }

    /// Destroy both credentials (logout, failed refresh).
    pub fn clear(&self) {
        self.store.remove(ACCESS_TOKEN_KEY);
        self.store.remove(REFRESH_TOKEN_KEY);
    }

    /// Identity of the logged-in user, from the access token's claims.
    /// `None` when logged out or when the token carries no identity claim.
    #[must_use]
    pub fn identity(&self) -> Option<IdentityKey> {
        self.access_token()
            .and_then(|token| resolve_identity(&token))
    }
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Unknown,
    Authenticated,
    Expired,
    Refreshing,
    Unauthenticated,
}

/// Drives the session state machine over the credential store.
#[derive(Clone)]
pub struct SessionManager {
    credentials: CredentialStore,
    api: ApiClient,
    status: Arc<Mutex<AuthStatus>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(credentials: CredentialStore, api: ApiClient) -> Self {
        Self {
            credentials,
            api,
            status: Arc::new(Mutex::new(AuthStatus::Unknown)),
        }
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Last observed session state.
    #[must_use]
    pub fn status(&self) -> AuthStatus {
        self.status
            .lock()
            .map_or(AuthStatus::Unknown, |guard| *guard)
    }

    fn set_status(&self, status: AuthStatus) {
        if let Ok(mut guard) = self.status.lock() {
            *guard = status;
        }
    }

    /// Log in with username and password, storing the credential pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint rejects the credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let pair = self.api.login(username, password).await?;
        self.credentials.store_pair(&pair);
        self.set_status(AuthStatus::Authenticated);
        info!(username = %username, "Logged in");
        Ok(())
    }

    /// Log out, destroying both credentials.
    pub fn logout(&self) {
        self.credentials.clear();
        self.set_status(AuthStatus::Unauthenticated);
        info!("Logged out");
    }

    /// Determine the current session state, refreshing once if the access
    /// token has expired.
    ///
    /// A malformed access token is treated exactly like an absent one; this
    /// method never fails.
    pub async fn check_status(&self) -> AuthStatus {
        let Some(access) = self.credentials.access_token() else {
            self.set_status(AuthStatus::Unauthenticated);
            return AuthStatus::Unauthenticated;
        };

        let Some(expiry) = claims::expires_at(&access) else {
            debug!("Access token is malformed, treating as unauthenticated");
            self.set_status(AuthStatus::Unauthenticated);
            return AuthStatus::Unauthenticated;
        };

        if expiry < Utc::now() {
            debug!(expired_at = %expiry, "Access token expired");
            self.set_status(AuthStatus::Expired);
            return self.refresh().await;
        }

        self.set_status(AuthStatus::Authenticated);
        AuthStatus::Authenticated
    }

    /// Attempt a single silent refresh.
    ///
    /// One attempt per expiry detection: any failure clears the credentials
    /// and lands in `Unauthenticated` rather than retrying, so an outage
    /// cannot turn into a refresh storm.
    pub async fn refresh(&self) -> AuthStatus {
        self.set_status(AuthStatus::Refreshing);

        let Some(refresh) = self.credentials.refresh_token() else {
            self.credentials.clear();
            self.set_status(AuthStatus::Unauthenticated);
            return AuthStatus::Unauthenticated;
        };

        match self.api.refresh_token(&refresh).await {
            Ok(response) => {
                // A rotated refresh token replaces the pair in one write;
                // otherwise only the access token changes.
                if let Some(rotated) = response.refresh {
                    self.credentials.store_pair(&TokenPair {
                        access: response.access,
                        refresh: rotated,
                    });
                } else {
                    self.credentials.store_access(&response.access);
                }
                self.set_status(AuthStatus::Authenticated);
                info!("Access token refreshed");
                AuthStatus::Authenticated
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing credentials");
                self.credentials.clear();
                self.set_status(AuthStatus::Unauthenticated);
                AuthStatus::Unauthenticated
            }
        }
    }

    /// Return a bearer token for an authenticated call, or
    /// [`ApiError::Unauthenticated`] when the session cannot be established.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthenticated`] if no valid session exists.
    pub async fn bearer_token(&self) -> Result<String, ApiError> {
        if self.check_status().await != AuthStatus::Authenticated {
            return Err(ApiError::Unauthenticated);
        }
        self.credentials
            .access_token()
            .ok_or(ApiError::Unauthenticated)
    }

    /// Schedule a single wake-up at the access token's expiry, at which
    /// point `check_status` runs once (driving a refresh if still expired).
    ///
    /// One timer per credential load instead of a fixed-interval poll.
    /// Returns `None` when there is no decodable expiry to wait for.
    #[must_use]
    pub fn watch_expiry(&self) -> Option<tokio::task::JoinHandle<AuthStatus>> {
        let access = self.credentials.access_token()?;
        let expiry = claims::expires_at(&access)?;
        let wait = (expiry - Utc::now()).to_std().unwrap_or_default();

        let manager = self.clone();
        Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            debug!("Expiry timer fired, re-checking session");
            manager.check_status().await
        }))
    }
}
