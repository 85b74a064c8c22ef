//! # Readmark OAuth
//!
//! OAuth 1.0a request signing for the Readmark API.
//!
//! This crate provides:
//! - `Signer` producing `Authorization` header values (HMAC-SHA1)
//! - `Token` for the optional per-user access token
//! - RFC 3986 percent encoding/decoding as used in signature base strings
//!
//! This is a pure crate with no network I/O. Every signing call draws a
//! fresh nonce and timestamp; no state persists between calls.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod percent;
mod signer;

pub use error::{OauthError, OauthResult};
pub use percent::{percent_decode, percent_encode};
pub use signer::{Signer, Token};
