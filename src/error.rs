use thiserror::Error;

/// Failure classes for remote API calls.
///
/// The taxonomy matters to callers: structural failures are recoverable
/// locally (the hide coordinator falls back to the visibility overlay),
/// permission failures must always be surfaced, and transport failures are
/// transient and never corrupt local state.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a usable response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The route or operation does not exist on the server
    /// (404 / 405 / 410 / 501 class).
    #[error("endpoint not available (status {status})")]
    Structural { status: u16 },

    /// The server understood the request and refused it (401 / 403).
    #[error("permission denied (status {status})")]
    PermissionDenied { status: u16 },

    /// No usable credentials are held locally.
    #[error("not authenticated")]
    Unauthenticated,

    /// Any other non-success response.
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Caller-side validation failure; user-facing and non-fatal.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    /// Classify a non-success HTTP status into the taxonomy.
    #[must_use]
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 | 403 => Self::PermissionDenied {
                status: status.as_u16(),
            },
            404 | 405 | 410 | 501 => Self::Structural {
                status: status.as_u16(),
            },
            s => Self::Api { status: s, message },
        }
    }

    /// Whether this failure means "the operation is not supported here",
    /// as opposed to "the operation was refused or broke".
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. })
    }

    /// Whether this failure is an authorization denial.
    #[must_use]
    pub const fn is_permission(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        assert!(ApiError::from_status(StatusCode::NOT_FOUND, String::new()).is_structural());
        assert!(
            ApiError::from_status(StatusCode::METHOD_NOT_ALLOWED, String::new()).is_structural()
        );
        assert!(ApiError::from_status(StatusCode::NOT_IMPLEMENTED, String::new()).is_structural());
        assert!(ApiError::from_status(StatusCode::FORBIDDEN, String::new()).is_permission());
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, String::new()).is_permission());

        let other = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
        assert!(!other.is_structural());
        assert!(!other.is_permission());
    }
}
