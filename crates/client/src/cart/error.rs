//! Cart operation errors.

use thiserror::Error;

/// Code reported for failures that never produced a backend response.
///
/// The backend only issues small integers, so this cannot collide with a
/// real `ResponseCode` or an HTTP status.
pub const NETWORK_FAILURE_CODE: i64 = -1000;

/// Errors that can occur when calling the cart backend.
#[derive(Debug, Error)]
pub enum CartError {
    /// The request never completed, timed out, or the response could not
    /// be decoded.
    #[error("network failure: {message}")]
    NetworkFailure {
        /// Transport or decode error description.
        message: String,
    },

    /// The backend refused the add because the item is out of stock.
    #[error("out of stock ({code}): {message}")]
    OutOfStock {
        /// Backend response code.
        code: i64,
        /// Backend message, verbatim.
        message: String,
    },

    /// The backend answered with a non-success code or HTTP status.
    #[error("backend rejected request ({code}): {message}")]
    BackendRejected {
        /// Backend response code, or the HTTP status for non-2xx replies.
        code: i64,
        /// Backend message, verbatim.
        message: String,
    },

    /// The operation was attempted without a required input. No request
    /// was sent.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
}

impl CartError {
    /// Numeric code for the failure.
    ///
    /// Returns [`NETWORK_FAILURE_CODE`] when the server was never reached
    /// and `None` for precondition failures.
    #[must_use]
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::NetworkFailure { .. } => Some(NETWORK_FAILURE_CODE),
            Self::OutOfStock { code, .. } | Self::BackendRejected { code, .. } => Some(*code),
            Self::PreconditionFailed(_) => None,
        }
    }

    /// Whether the failure is the recoverable out-of-stock case.
    #[must_use]
    pub const fn is_out_of_stock(&self) -> bool {
        matches!(self, Self::OutOfStock { .. })
    }

    /// Whether the request reached the server at all.
    #[must_use]
    pub const fn reached_server(&self) -> bool {
        matches!(self, Self::OutOfStock { .. } | Self::BackendRejected { .. })
    }

    /// Shopper-facing message.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        if self.is_out_of_stock() {
            "This item is currently unavailable."
        } else {
            "Something went wrong. Please try again."
        }
    }

    pub(crate) fn network(message: impl Into<String>) -> Self {
        Self::NetworkFailure {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for CartError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::network(format!("request timed out: {e}"))
        } else if e.is_connect() {
            Self::network(format!("connection failed: {e}"))
        } else {
            Self::network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for CartError {
    fn from(e: serde_json::Error) -> Self {
        Self::network(format!("undecodable response: {e}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            CartError::network("refused").code(),
            Some(NETWORK_FAILURE_CODE)
        );
        let err = CartError::OutOfStock {
            code: 3,
            message: "No stock".to_string(),
        };
        assert_eq!(err.code(), Some(3));
        assert_eq!(
            CartError::PreconditionFailed("cart id".to_string()).code(),
            None
        );
    }

    #[test]
    fn test_user_message_split() {
        let oos = CartError::OutOfStock {
            code: 3,
            message: String::new(),
        };
        let rejected = CartError::BackendRejected {
            code: -1,
            message: "boom".to_string(),
        };
        assert!(oos.user_message().contains("unavailable"));
        assert!(rejected.user_message().contains("try again"));
        assert!(CartError::network("x").user_message().contains("try again"));
    }

    #[test]
    fn test_reached_server() {
        assert!(!CartError::network("x").reached_server());
        assert!(!CartError::PreconditionFailed("x".to_string()).reached_server());
        assert!(
            CartError::BackendRejected {
                code: -1,
                message: String::new()
            }
            .reached_server()
        );
    }

    #[test]
    fn test_display_passes_backend_message_through() {
        let err = CartError::BackendRejected {
            code: -2,
            message: "Invalid item code".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "backend rejected request (-2): Invalid item code"
        );
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CartError::from(json_err);
        assert!(matches!(err, CartError::NetworkFailure { .. }));
    }
}
