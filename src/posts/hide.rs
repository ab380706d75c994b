//! Delete/hide coordinator.
//!
//! The backend's authoritative delete contract is not guaranteed to exist,
//! so the coordinator probes a fixed sequence of candidate DELETE routes.
//! The two-tier policy is the core contract here: try real deletion first,
//! soft-hide locally only when every candidate is structurally missing, and
//! never downgrade an authorization denial into a soft-hide - a permission
//! error means the route exists and the server said no.

use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::constants::DELETE_ENDPOINT_TEMPLATES;
use crate::error::ApiError;

use super::overlay::VisibilityOverlay;

/// How a hide request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HideOutcome {
    /// True when no delete endpoint existed and the post was hidden via the
    /// local visibility overlay instead.
    pub used_fallback: bool,
}

/// Coordinates authoritative deletion attempts with the local overlay.
pub struct HideCoordinator {
    api: ApiClient,
    overlay: VisibilityOverlay,
}

impl HideCoordinator {
    #[must_use]
    pub fn new(api: ApiClient, overlay: VisibilityOverlay) -> Self {
        Self { api, overlay }
    }

    /// Remove a post from the user's view.
    ///
    /// Probes each candidate delete endpoint in order. The first success
    /// wins (`used_fallback = false`). Structural failures (route missing /
    /// not implemented) advance the chain; when the whole chain is
    /// structural, the post is hidden locally (`used_fallback = true`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::PermissionDenied`] immediately if any candidate
    /// refuses authorization - the chain stops and nothing is hidden.
    /// Transport and other server failures are surfaced the same way.
    pub async fn request_hide(&self, token: &str, post_id: i64) -> Result<HideOutcome, ApiError> {
        let id = post_id.to_string();

        for template in DELETE_ENDPOINT_TEMPLATES {
            let path = template.replace("{id}", &id);
            match self.api.delete_at(token, &path).await {
                Ok(()) => {
                    info!(post_id, endpoint = %path, "Post deleted on server");
                    return Ok(HideOutcome {
                        used_fallback: false,
                    });
                }
                Err(e) if e.is_structural() => {
                    debug!(post_id, endpoint = %path, error = %e, "Delete endpoint missing, trying next");
                }
                Err(e) if e.is_permission() => {
                    warn!(post_id, endpoint = %path, "Delete refused by server, not falling back");
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }

        self.overlay.mark_hidden(post_id);
        info!(post_id, "No delete endpoint available, hidden locally");
        Ok(HideOutcome {
            used_fallback: true,
        })
    }
}
