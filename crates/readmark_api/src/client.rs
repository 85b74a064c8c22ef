//! The retrying API client.

use crate::error::{ApiError, ApiResult, CODE_RATE_LIMITED};
use crate::http::{CancelToken, HttpBackend, HttpResponse, ReqwestBackend, Sleeper, ThreadSleeper};
use readmark_oauth::{percent_decode, percent_encode, Signer, Token};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default request timeout when the caller passes zero.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
/// Default backoff base when the caller passes zero.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Bounded-retry policy for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Clamped to at least 1.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles per retry.
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy; zero backoff falls back to the default base.
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff: if base_backoff.is_zero() {
                DEFAULT_BACKOFF
            } else {
                base_backoff
            },
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(1, DEFAULT_BACKOFF)
    }

    /// Backoff to sleep after the failed attempt with this zero-based
    /// index: `base * 2^attempt_index`.
    pub fn delay_after_attempt(&self, attempt_index: u32) -> Duration {
        self.base_backoff * (1u32 << attempt_index.min(20))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

/// Client for the Readmark HTTP API.
///
/// All requests are form-encoded POSTs carrying an OAuth 1.0a
/// `Authorization` header. One instance serves one account; the access
/// token is optional only during the xAuth bootstrap.
pub struct Client<B: HttpBackend = ReqwestBackend> {
    base_url: String,
    signer: Signer,
    token: Option<Token>,
    backend: B,
    user_agent: String,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancelToken,
}

impl Client<ReqwestBackend> {
    /// Creates a client over the production HTTP stack.
    pub fn new(
        base_url: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: Option<Token>,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let timeout = if timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            timeout
        };
        let backend = ReqwestBackend::new(timeout)?;
        Ok(Self::with_backend(
            base_url,
            consumer_key,
            consumer_secret,
            token,
            backend,
        ))
    }
}

impl<B: HttpBackend> Client<B> {
    /// Creates a client over an arbitrary backend (tests use scripted ones).
    pub fn with_backend(
        base_url: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: Option<Token>,
        backend: B,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            signer: Signer::new(consumer_key, consumer_secret),
            token,
            backend,
            user_agent: format!("readmark-cli/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryPolicy::no_retry(),
            sleeper: Arc::new(ThreadSleeper),
            cancel: CancelToken::new(),
        }
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the underlying backend; tests use this to inspect fakes.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Installs the access token, e.g. after an xAuth exchange.
    pub fn set_token(&mut self, token: Option<Token>) {
        self.token = token;
    }

    /// Configures bounded retry for transient failures.
    pub fn set_retry(&mut self, max_attempts: u32, base_backoff: Duration) {
        self.retry = RetryPolicy::new(max_attempts, base_backoff);
    }

    /// Replaces the backoff sleeper. Tests use a recording sleeper.
    pub fn set_sleeper(&mut self, sleeper: Arc<dyn Sleeper>) {
        self.sleeper = sleeper;
    }

    /// Installs a cancellation token checked between retry attempts.
    pub fn set_cancel_token(&mut self, cancel: CancelToken) {
        self.cancel = cancel;
    }

    /// Signs and posts a form-encoded request, retrying transient
    /// failures per the configured policy.
    ///
    /// Retryable outcomes: HTTP 429, HTTP 5xx, the service's rate-limit
    /// error code, and network/timeout failures. On exhaustion the last
    /// response (or error) is returned as-is; terminal outcomes return
    /// immediately. Cancellation aborts before the next attempt and is
    /// never retried.
    pub fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
        accept: &str,
    ) -> ApiResult<HttpResponse> {
        let attempts = self.retry.max_attempts.max(1);
        let mut last_response: Option<HttpResponse> = None;
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                self.sleeper
                    .sleep(self.retry.delay_after_attempt(attempt - 1));
            }
            if self.cancel.is_cancelled() {
                return Err(ApiError::Cancelled);
            }

            let start = Instant::now();
            match self.post_form_once(path, form, accept) {
                Ok(response) => {
                    tracing::debug!(
                        method = "POST",
                        url = %self.redacted_url(path),
                        status = response.status,
                        duration_ms = start.elapsed().as_millis() as u64,
                        attempt,
                        "request"
                    );
                    if !should_retry(response.status, &response.body) {
                        return Ok(response);
                    }
                    last_response = Some(response);
                    last_error = None;
                }
                Err(err) => {
                    tracing::debug!(
                        method = "POST",
                        url = %self.redacted_url(path),
                        error = %err,
                        duration_ms = start.elapsed().as_millis() as u64,
                        attempt,
                        "request failed"
                    );
                    if matches!(err, ApiError::Cancelled) || !err.is_retryable() {
                        return Err(err);
                    }
                    last_response = None;
                    last_error = Some(err);
                }
            }
        }

        match (last_response, last_error) {
            (Some(response), _) => Ok(response),
            (None, Some(err)) => Err(err),
            (None, None) => Err(ApiError::Network("no attempts made".into())),
        }
    }

    fn post_form_once(
        &self,
        path: &str,
        form: &[(String, String)],
        accept: &str,
    ) -> ApiResult<HttpResponse> {
        let url = format!("{}{}", self.base_url, path);
        let authorization =
            self.signer
                .authorization_header("POST", &url, form, self.token.as_ref())?;

        let mut headers = vec![
            (
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ),
            ("Authorization".to_string(), authorization),
            ("User-Agent".to_string(), self.user_agent.clone()),
        ];
        if !accept.is_empty() {
            headers.push(("Accept".to_string(), accept.to_string()));
        }

        self.backend.post(&url, &headers, &encode_form(form))
    }

    /// URL with the query stripped, safe for logs.
    fn redacted_url(&self, path: &str) -> String {
        let full = format!("{}{}", self.base_url, path);
        full[..full.find('?').unwrap_or(full.len())].to_string()
    }
}

/// Encodes form fields as an `application/x-www-form-urlencoded` body.
pub fn encode_form(form: &[(String, String)]) -> String {
    let parts: Vec<String> = form
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect();
    parts.join("&")
}

/// Parses a querystring-formatted body (`k=v&k2=v2`) into pairs.
pub fn parse_query(body: &str) -> ApiResult<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for part in body.trim().split('&') {
        if part.is_empty() {
            continue;
        }
        let (key, value) = part.split_once('=').unwrap_or((part, ""));
        let key = percent_decode(&key.replace('+', " "))
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let value = percent_decode(&value.replace('+', " "))
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        pairs.push((key, value));
    }
    Ok(pairs)
}

/// Whether the raw outcome warrants another attempt.
fn should_retry(status: u16, body: &[u8]) -> bool {
    if status == 429 || status >= 500 {
        return true;
    }
    parse_service_error(body)
        .map(|(code, _)| code == CODE_RATE_LIMITED)
        .unwrap_or(false)
}

/// Extracts a `{code, message}` service error from an error-array body.
///
/// The service reports errors as a JSON array whose first element is
/// `{"type": "error", "error_code": ..., "message": ...}`.
pub fn parse_service_error(body: &[u8]) -> Option<(i64, String)> {
    let trimmed = crate::types::trim_ascii(body);
    if trimmed.first() != Some(&b'[') {
        return None;
    }
    let items: Vec<serde_json::Value> = serde_json::from_slice(trimmed).ok()?;
    let first = items.first()?;

    #[derive(Deserialize)]
    struct ErrorRecord {
        #[serde(rename = "type", default)]
        kind: String,
        #[serde(default)]
        error_code: crate::types::IntValue,
        #[serde(default)]
        message: String,
    }
    let record: ErrorRecord = serde_json::from_value(first.clone()).ok()?;
    if record.kind != "error" {
        return None;
    }
    Some((record.error_code.0, record.message))
}

/// Maps a raw response to `Ok` or a typed error.
///
/// A service error payload wins even under HTTP 200.
pub fn ensure_ok(response: &HttpResponse) -> ApiResult<()> {
    if let Some((code, message)) = parse_service_error(&response.body) {
        return Err(ApiError::service(code, message));
    }
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: String::from_utf8_lossy(crate::types::trim_ascii(&response.body)).into_owned(),
    })
}

/// Decodes a JSON array body, surfacing a service error payload as the
/// typed error.
pub fn decode_array(body: &[u8]) -> ApiResult<Vec<serde_json::Value>> {
    let trimmed = crate::types::trim_ascii(body);
    if trimmed.is_empty() {
        return Err(ApiError::Decode("empty body".into()));
    }
    if trimmed.first() != Some(&b'[') {
        return Err(ApiError::Decode("expected JSON array".into()));
    }
    if let Some((code, message)) = parse_service_error(trimmed) {
        return Err(ApiError::service(code, message));
    }
    serde_json::from_slice(trimmed).map_err(|e| ApiError::Decode(e.to_string()))
}
