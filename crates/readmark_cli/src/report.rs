//! Error reporting and exit-code mapping.
//!
//! Every error maps to one exit-code band so scripted callers can
//! branch without parsing text. The structured-stderr toggle is an
//! explicit field on the reporter, set once in `main`.

use readmark_api::{
    ApiError, CODE_APP_SUSPENDED, CODE_PREMIUM_REQUIRED, CODE_RATE_LIMITED,
    MALFORMED_REQUEST_CODES, SERVER_ERROR_CODES,
};
use readmark_sync::SyncError;
use thiserror::Error;

/// Exit code for usage and validation failures.
pub const EXIT_USAGE: i32 = 2;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error from the API client.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Error from the sync walker or filters.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Bad flags or arguments.
    #[error("{0}")]
    Usage(String),

    /// Config file problems.
    #[error("config error: {0}")]
    Config(String),

    /// Command needs an access token and none is stored.
    #[error("not logged in; run `readmark auth login`")]
    NotLoggedIn,

    /// Consumer credentials are missing everywhere we looked.
    #[error("missing consumer key/secret (set {key}/{secret} or use `readmark config set`)",
        key = crate::config::ENV_CONSUMER_KEY,
        secret = crate::config::ENV_CONSUMER_SECRET)]
    MissingConsumer,

    /// Local I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Usage-error helper.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    fn as_api(&self) -> Option<&ApiError> {
        match self {
            CliError::Api(err) => Some(err),
            CliError::Sync(SyncError::Api(err)) => Some(err),
            _ => None,
        }
    }

    /// Exit code band for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => EXIT_USAGE,
            CliError::Sync(
                SyncError::InvalidLimit(_)
                | SyncError::InvalidMaxPages
                | SyncError::InvalidBound(_)
                | SyncError::InvalidTimeValue(_)
                | SyncError::UnknownBoundField(_)
                | SyncError::InvalidSelect(_),
            ) => EXIT_USAGE,
            _ => match self.as_api().and_then(ApiError::service_code) {
                Some(CODE_RATE_LIMITED) => 10,
                Some(CODE_PREMIUM_REQUIRED) => 11,
                Some(CODE_APP_SUSPENDED) => 12,
                Some(code) if MALFORMED_REQUEST_CODES.contains(&code) => 13,
                Some(code) if SERVER_ERROR_CODES.contains(&code) => 14,
                _ => 1,
            },
        }
    }

    /// Stable machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        if let Some(api) = self.as_api() {
            return match api {
                ApiError::Service { code, .. } => match *code {
                    CODE_RATE_LIMITED => "rate_limited",
                    CODE_PREMIUM_REQUIRED => "premium_required",
                    CODE_APP_SUSPENDED => "app_suspended",
                    c if MALFORMED_REQUEST_CODES.contains(&c) => "invalid_request",
                    c if SERVER_ERROR_CODES.contains(&c) => "server_error",
                    _ => "api_error",
                },
                ApiError::Timeout => "timeout",
                ApiError::Network(_) => "network_error",
                ApiError::Http { .. } => "api_error",
                ApiError::Cancelled => "cancelled",
                ApiError::Oauth(_) => "auth_error",
                ApiError::Decode(_) => "api_error",
            };
        }
        match self {
            CliError::Usage(_) => "invalid_usage",
            CliError::Config(_) => "config_error",
            CliError::NotLoggedIn => "auth_error",
            CliError::MissingConsumer => "config_error",
            CliError::Io(_) => "io_error",
            CliError::Sync(
                SyncError::InvalidLimit(_)
                | SyncError::InvalidMaxPages
                | SyncError::InvalidBound(_)
                | SyncError::InvalidTimeValue(_)
                | SyncError::UnknownBoundField(_)
                | SyncError::InvalidSelect(_),
            ) => "invalid_usage",
            _ => "unknown",
        }
    }

    /// Human hint for well-known service errors.
    pub fn hint(&self) -> Option<&'static str> {
        let code = self.as_api().and_then(ApiError::service_code)?;
        let hint = match code {
            1040 => "rate limit exceeded; wait and retry",
            1041 => "requires a premium subscription",
            1042 => "application suspended; check the service status page",
            1220 => "supply content for this bookmark",
            1221 => "the URL is not available from this source",
            1240 => "invalid URL",
            1241 => "invalid bookmark ID",
            1242 => "invalid folder ID",
            1243 => "invalid progress value",
            1244 => "invalid progress timestamp",
            1245 => "private source requires supplied content",
            1250 => "invalid title or unexpected error saving bookmark",
            1251 => "folder already exists",
            1252 => "cannot add bookmarks to this folder",
            1500 => "temporary service error; retry later",
            1550 => "text view generation error; retry later",
            1600 => "highlight text is required",
            1601 => "duplicate highlight",
            _ => return None,
        };
        Some(hint)
    }
}

/// Prints errors to stderr, as text or NDJSON.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    /// Emit errors as single-line JSON objects instead of text.
    pub json: bool,
}

impl Reporter {
    /// Creates a reporter; `json` selects structured stderr.
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Prints the error and returns its exit code.
    pub fn fail(&self, err: &CliError) -> i32 {
        let exit_code = err.exit_code();
        if self.json {
            let mut payload = serde_json::json!({
                "error": err.to_string(),
                "code": err.error_code(),
                "exit_code": exit_code,
            });
            if let Some(api_code) = err.as_api().and_then(ApiError::service_code) {
                payload["api_code"] = serde_json::json!(api_code);
            }
            if let Some(hint) = err.hint() {
                payload["hint"] = serde_json::json!(hint);
            }
            eprintln!("{payload}");
        } else {
            eprintln!("error: {err}");
            if let Some(hint) = err.hint() {
                eprintln!("hint: {hint}");
            }
        }
        exit_code
    }

    /// Prints a usage message and returns the usage exit code.
    pub fn usage(&self, msg: &str) -> i32 {
        self.fail(&CliError::usage(msg))
    }

    /// Prints a non-fatal per-item error without deciding the exit code.
    pub fn warn(&self, err: &CliError) {
        if self.json {
            eprintln!(
                "{}",
                serde_json::json!({
                    "error": err.to_string(),
                    "code": err.error_code(),
                })
            );
        } else {
            eprintln!("error: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(code: i64) -> CliError {
        CliError::Api(ApiError::service(code, "boom"))
    }

    #[test]
    fn exit_code_bands() {
        assert_eq!(service(1040).exit_code(), 10);
        assert_eq!(service(1041).exit_code(), 11);
        assert_eq!(service(1042).exit_code(), 12);
        assert_eq!(service(1240).exit_code(), 13);
        assert_eq!(service(1601).exit_code(), 13);
        assert_eq!(service(1500).exit_code(), 14);
        assert_eq!(service(9999).exit_code(), 1);
        assert_eq!(CliError::usage("bad flag").exit_code(), EXIT_USAGE);
        assert_eq!(
            CliError::Api(ApiError::Timeout).exit_code(),
            1
        );
        assert_eq!(
            CliError::Sync(SyncError::InvalidLimit(501)).exit_code(),
            EXIT_USAGE
        );
        assert_eq!(
            CliError::Sync(SyncError::MaxPagesExceeded { pages: 2 }).exit_code(),
            1
        );
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(service(1040).error_code(), "rate_limited");
        assert_eq!(service(1242).error_code(), "invalid_request");
        assert_eq!(service(1550).error_code(), "server_error");
        assert_eq!(CliError::Api(ApiError::Timeout).error_code(), "timeout");
        assert_eq!(
            CliError::Api(ApiError::Network("x".into())).error_code(),
            "network_error"
        );
        assert_eq!(CliError::NotLoggedIn.error_code(), "auth_error");
        assert_eq!(CliError::usage("x").error_code(), "invalid_usage");
    }

    #[test]
    fn nested_api_error_inside_sync_maps_the_same() {
        let err = CliError::Sync(SyncError::Api(ApiError::service(1040, "slow down")));
        assert_eq!(err.exit_code(), 10);
        assert_eq!(err.error_code(), "rate_limited");
    }

    #[test]
    fn hints_exist_for_known_codes_only() {
        assert!(service(1040).hint().is_some());
        assert!(service(1251).hint().is_some());
        assert!(service(9999).hint().is_none());
        assert!(CliError::NotLoggedIn.hint().is_none());
    }
}
