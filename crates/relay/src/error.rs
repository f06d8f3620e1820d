/// Result type for [`RelayClient`] operations.
///
/// [`RelayClient`]: crate::RelayClient
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors returned by the [`RelayClient`].
///
/// [`RelayClient`]: crate::RelayClient
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum RelayError {
    /// The relay rejected the request signature, or the request was unsigned.
    #[error("Relay rejected the request signature")]
    Unauthorized,
    /// The relay is rate limiting this identity.
    #[error("Relay is rate limiting requests")]
    RateLimited,
    /// The requested bundle was not found.
    #[error("Bundle not found at relay")]
    NotFound,
    /// The relay answered with an unexpected HTTP status.
    #[error("Relay returned HTTP status {0}")]
    Status(reqwest::StatusCode),
    /// The relay returned a JSON-RPC error object.
    #[error("Relay RPC error {code}: {message}")]
    Rpc {
        /// The JSON-RPC error code.
        code: i64,
        /// The JSON-RPC error message.
        message: String,
    },

    /// An error occurred while parsing the URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// Signing the request body failed.
    #[error("Failed to sign relay request: {0}")]
    Signer(#[from] alloy::signers::Error),

    /// The relay response could not be decoded.
    #[error("Failed to decode relay response: {0}")]
    Json(#[from] serde_json::Error),

    /// An error occurred while contacting the relay.
    #[error("Error contacting relay: {0}")]
    Reqwest(reqwest::Error),
}

impl RelayError {
    /// True if retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited | Self::Reqwest(_) => true,
            Self::Status(status) => status.is_server_error(),
            _ => false,
        }
    }
}

impl From<reqwest::StatusCode> for RelayError {
    fn from(status: reqwest::StatusCode) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                RelayError::Unauthorized
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => RelayError::RateLimited,
            reqwest::StatusCode::NOT_FOUND => RelayError::NotFound,
            status => RelayError::Status(status),
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => status.into(),
            None => RelayError::Reqwest(err),
        }
    }
}
