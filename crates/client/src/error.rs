use logibooks_core::error::CoreError;

/// Errors from the REST layer.
///
/// `Display` of [`ApiError::Status`] and [`ApiError::Unprocessable`] is the
/// server-supplied message alone, so it can be shown to users as-is.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server could not be reached at all (DNS, refused connection,
    /// timeout). Carries a localized message.
    #[error("{0}")]
    Unreachable(String),

    /// Any other failure inside the HTTP client.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status other than 422.
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        /// Decoded error body, when it was JSON.
        payload: Option<serde_json::Value>,
    },

    /// HTTP 422: the body is a structured validation report the caller
    /// is expected to inspect.
    #[error("{message}")]
    Unprocessable {
        message: String,
        payload: serde_json::Value,
    },

    /// The body did not match the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A body was required but the server sent none.
    #[error("Empty response body")]
    EmptyBody,
}

impl ApiError {
    /// HTTP status attached to the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Unprocessable { .. } => Some(422),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Errors from loading [`ClientConfig`](crate::ClientConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}
