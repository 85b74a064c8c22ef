//! Error types for the sync crate.

use readmark_api::ApiError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during an incremental sync walk.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Error from the API client.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// I/O error touching the cursor file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The cursor file exists but does not parse.
    #[error("parse cursor {path}: {message}")]
    CursorParse {
        /// Cursor file path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Requested limit is outside the server's accepted range.
    #[error("invalid limit {0} (expected 0..={max})", max = crate::pager::MAX_PAGE_SIZE)]
    InvalidLimit(i64),

    /// Max-pages safety cap must be positive.
    #[error("max pages must be positive")]
    InvalidMaxPages,

    /// An open-ended walk ran past the safety cap. Raise the cap or
    /// supply an explicit limit.
    #[error("list exceeded {pages} pages; raise the max-pages cap or set a limit")]
    MaxPagesExceeded {
        /// Pages fetched before giving up.
        pages: u32,
    },

    /// A bound expression does not parse.
    #[error("invalid bound {0:?}")]
    InvalidBound(String),

    /// A bound value is neither an integer, RFC 3339, nor a date.
    #[error("invalid time value: {0}")]
    InvalidTimeValue(String),

    /// A bound names an unknown field.
    #[error("unknown bound field: {0}")]
    UnknownBoundField(String),

    /// A select expression does not parse or names an illegal
    /// field/operator/value combination.
    #[error("invalid select filter: {0}")]
    InvalidSelect(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_pages_error_is_actionable() {
        let err = SyncError::MaxPagesExceeded { pages: 200 };
        let text = err.to_string();
        assert!(text.contains("200"));
        assert!(text.contains("max-pages"));
    }
}
