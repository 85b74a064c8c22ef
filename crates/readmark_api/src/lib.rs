//! # Readmark API
//!
//! Client for the Readmark bookmark service.
//!
//! This crate provides:
//! - Wire types with lenient scalar decoding (`Bookmark`, `Folder`, ...)
//! - A typed error taxonomy with a retryable/terminal split
//! - A blocking HTTP transport behind the `HttpBackend` seam
//! - A bounded-retry client covering every service endpoint
//!
//! ## Retry model
//!
//! A response is retried when the HTTP status is 429 or 5xx, when the
//! service reports its rate-limit error code, or on network/timeout
//! failures. Backoff doubles per attempt from a configurable base. All
//! calls are assumed idempotent or safely re-issuable by the service.
//!
//! Execution is single-threaded and blocking; a `CancelToken` checked
//! between attempts is the only cross-cutting control.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod endpoints;
mod error;
mod http;
mod types;

pub use client::{
    decode_array, encode_form, ensure_ok, parse_query, parse_service_error, Client, RetryPolicy,
    DEFAULT_BACKOFF, DEFAULT_TIMEOUT,
};
pub use endpoints::{AddBookmarkRequest, ListOptions};
pub use error::{
    ApiError, ApiResult, CODE_APP_SUSPENDED, CODE_PREMIUM_REQUIRED,
    CODE_PRIVATE_REQUIRES_CONTENT, CODE_RATE_LIMITED, MALFORMED_REQUEST_CODES, SERVER_ERROR_CODES,
};
pub use http::{CancelToken, HttpBackend, HttpResponse, ReqwestBackend, Sleeper, ThreadSleeper};
pub use readmark_oauth::Token;
pub use types::{
    Bookmark, BoolValue, FloatValue, Folder, Highlight, IntValue, ListResponse, Tag, User,
};
