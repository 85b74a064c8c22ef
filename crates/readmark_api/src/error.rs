//! Error types for the API client.

use readmark_oauth::OauthError;
use thiserror::Error;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Application error code the service uses for rate limiting.
pub const CODE_RATE_LIMITED: i64 = 1040;
/// Application error code for subscription-gated endpoints.
pub const CODE_PREMIUM_REQUIRED: i64 = 1041;
/// Application error code for a suspended consumer application.
pub const CODE_APP_SUSPENDED: i64 = 1042;
/// Application error code for a private bookmark missing its content.
pub const CODE_PRIVATE_REQUIRES_CONTENT: i64 = 1245;

/// Application error codes the service reports for malformed requests.
pub const MALFORMED_REQUEST_CODES: &[i64] = &[
    1220, 1221, 1240, 1241, 1242, 1243, 1244, 1245, 1250, 1251, 1252, 1600, 1601,
];
/// Application error codes the service reports for its own failures.
pub const SERVER_ERROR_CODES: &[i64] = &[1500, 1550];

/// Errors that can occur while talking to the remote service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request signing failed before any network work.
    #[error(transparent)]
    Oauth(#[from] OauthError),

    /// Typed application error from the service (`{code, message}`).
    #[error("service error {code}: {message}")]
    Service {
        /// Application error code.
        code: i64,
        /// Human-readable message, possibly empty.
        message: String,
    },

    /// Non-2xx HTTP status without a parseable application error.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Trimmed response body.
        body: String,
    },

    /// Network failure below the HTTP layer.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The response body could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Creates a typed service error.
    pub fn service(code: i64, message: impl Into<String>) -> Self {
        Self::Service {
            code,
            message: message.into(),
        }
    }

    /// Returns the application error code, if this is a service error.
    pub fn service_code(&self) -> Option<i64> {
        match self {
            ApiError::Service { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if a fresh attempt may succeed.
    ///
    /// Retryable: network failures, timeouts, HTTP 429 and 5xx, and the
    /// service's rate-limit code. Everything else, including other 4xx
    /// application codes, is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout => true,
            ApiError::Http { status, .. } => *status == 429 || *status >= 500,
            ApiError::Service { code, .. } => *code == CODE_RATE_LIMITED,
            _ => false,
        }
    }
}
