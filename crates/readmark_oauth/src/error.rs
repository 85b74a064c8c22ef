//! Error types for request signing.

use thiserror::Error;

/// Result type for signing operations.
pub type OauthResult<T> = Result<T, OauthError>;

/// Errors that can occur while signing a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OauthError {
    /// Consumer key or secret is empty.
    #[error("missing consumer credentials")]
    MissingCredentials,

    /// Request URL lacks a scheme or host.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// Percent-decoding encountered a malformed escape or invalid UTF-8.
    #[error("invalid percent encoding: {0}")]
    InvalidEncoding(String),
}
