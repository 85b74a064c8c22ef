//! OAuth 1.0a request signing with HMAC-SHA1.

use crate::error::{OauthError, OauthResult};
use crate::percent::percent_encode;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha1 = Hmac<Sha1>;

/// An OAuth 1.0a access token and its secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token key, sent as the `oauth_token` parameter.
    pub key: String,
    /// Token secret. Never enters the parameter set; only the signing key.
    pub secret: String,
}

impl Token {
    /// Creates a token from a key/secret pair.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

/// Signs OAuth 1.0a requests using HMAC-SHA1.
#[derive(Debug, Clone)]
pub struct Signer {
    consumer_key: String,
    consumer_secret: String,
}

impl Signer {
    /// Creates a signer for the given consumer credentials.
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Returns the full value for the HTTP `Authorization` header.
    ///
    /// `body_params` are the `application/x-www-form-urlencoded` POST
    /// fields; they enter the signature base string. `token` is optional
    /// (absent for the xAuth access-token request). Each call draws a
    /// fresh random nonce and the current Unix timestamp.
    pub fn authorization_header(
        &self,
        method: &str,
        raw_url: &str,
        body_params: &[(String, String)],
        token: Option<&Token>,
    ) -> OauthResult<String> {
        let nonce = random_nonce();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        self.authorization_header_at(method, raw_url, body_params, token, &nonce, timestamp)
    }

    /// Deterministic variant of [`authorization_header`] taking an
    /// explicit nonce and timestamp. Identical inputs produce
    /// byte-identical headers.
    ///
    /// [`authorization_header`]: Signer::authorization_header
    pub fn authorization_header_at(
        &self,
        method: &str,
        raw_url: &str,
        body_params: &[(String, String)],
        token: Option<&Token>,
        nonce: &str,
        timestamp: i64,
    ) -> OauthResult<String> {
        if self.consumer_key.is_empty() || self.consumer_secret.is_empty() {
            return Err(OauthError::MissingCredentials);
        }

        let mut oauth_params: Vec<(String, String)> = vec![
            ("oauth_consumer_key".into(), self.consumer_key.clone()),
            ("oauth_nonce".into(), nonce.to_string()),
            ("oauth_signature_method".into(), "HMAC-SHA1".into()),
            ("oauth_timestamp".into(), timestamp.to_string()),
            ("oauth_version".into(), "1.0".into()),
        ];
        if let Some(token) = token {
            if !token.key.is_empty() {
                oauth_params.push(("oauth_token".into(), token.key.clone()));
            }
        }

        let normalized_url = normalize_url(raw_url)?;
        let param_string = normalize_params(&oauth_params, body_params);
        let base_string = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            percent_encode(&normalized_url),
            percent_encode(&param_string)
        );

        let mut signing_key = percent_encode(&self.consumer_secret);
        signing_key.push('&');
        if let Some(token) = token {
            signing_key.push_str(&percent_encode(&token.secret));
        }

        let signature = sign_hmac_sha1(&signing_key, &base_string);
        oauth_params.push(("oauth_signature".into(), signature));

        // Deterministic header ordering for easier debugging.
        oauth_params.sort_by(|a, b| a.0.cmp(&b.0));
        let parts: Vec<String> = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, percent_encode(v)))
            .collect();
        Ok(format!("OAuth {}", parts.join(", ")))
    }
}

/// Builds the normalized parameter string: oauth and body params
/// percent-encoded, sorted by (encoded key, encoded value), joined as
/// `k=v` pairs with `&`.
fn normalize_params(oauth_params: &[(String, String)], body_params: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = oauth_params
        .iter()
        .chain(body_params.iter())
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    pairs.sort();
    let parts: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
    parts.join("&")
}

/// Normalizes a URL for the signature base string: query and fragment
/// dropped, scheme and host lowercased, empty path defaulted to `/`.
fn normalize_url(raw_url: &str) -> OauthResult<String> {
    let (scheme, rest) = raw_url
        .split_once("://")
        .ok_or_else(|| OauthError::InvalidUrl(raw_url.to_string()))?;
    if scheme.is_empty() {
        return Err(OauthError::InvalidUrl(raw_url.to_string()));
    }
    let rest = &rest[..rest.find('#').unwrap_or(rest.len())];
    let rest = &rest[..rest.find('?').unwrap_or(rest.len())];
    let (host, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    if host.is_empty() {
        return Err(OauthError::InvalidUrl(raw_url.to_string()));
    }
    let path = if path.is_empty() { "/" } else { path };
    Ok(format!(
        "{}://{}{}",
        scheme.to_ascii_lowercase(),
        host.to_ascii_lowercase(),
        path
    ))
}

fn sign_hmac_sha1(key: &str, message: &str) -> String {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

fn random_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn signer() -> Signer {
        Signer::new("consumer-key", "consumer-secret")
    }

    fn form(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn header_params(header: &str) -> BTreeMap<String, String> {
        let rest = header.strip_prefix("OAuth ").unwrap();
        rest.split(", ")
            .map(|part| {
                let (k, v) = part.split_once('=').unwrap();
                (k.to_string(), v.trim_matches('"').to_string())
            })
            .collect()
    }

    #[test]
    fn fixed_nonce_and_timestamp_is_deterministic() {
        let body = form(&[("url", "https://example.com/article"), ("title", "A title")]);
        let token = Token::new("tok", "tok-secret");
        let a = signer()
            .authorization_header_at(
                "POST",
                "https://api.example.com/api/1/bookmarks/add",
                &body,
                Some(&token),
                "abcdef0123456789abcdef0123456789",
                1_700_000_000,
            )
            .unwrap();
        let b = signer()
            .authorization_header_at(
                "POST",
                "https://api.example.com/api/1/bookmarks/add",
                &body,
                Some(&token),
                "abcdef0123456789abcdef0123456789",
                1_700_000_000,
            )
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn random_nonces_differ_only_in_nonce_and_signature() {
        let body = form(&[("limit", "10")]);
        let s = signer();
        let a = s
            .authorization_header("POST", "https://api.example.com/api/1/bookmarks/list", &body, None)
            .unwrap();
        let b = s
            .authorization_header("POST", "https://api.example.com/api/1/bookmarks/list", &body, None)
            .unwrap();
        let pa = header_params(&a);
        let pb = header_params(&b);
        assert_eq!(
            pa.keys().collect::<Vec<_>>(),
            pb.keys().collect::<Vec<_>>()
        );
        for key in pa.keys() {
            match key.as_str() {
                "oauth_nonce" | "oauth_signature" | "oauth_timestamp" => {}
                _ => assert_eq!(pa[key], pb[key], "unexpected difference in {key}"),
            }
        }
        assert_ne!(pa["oauth_nonce"], pb["oauth_nonce"]);
    }

    #[test]
    fn parameter_order_does_not_affect_signature() {
        let forward = form(&[("b", "2"), ("a", "1"), ("c", "3")]);
        let backward = form(&[("c", "3"), ("a", "1"), ("b", "2")]);
        let a = signer()
            .authorization_header_at("POST", "https://api.example.com/x", &forward, None, "n", 1)
            .unwrap();
        let b = signer()
            .authorization_header_at("POST", "https://api.example.com/x", &backward, None, "n", 1)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn token_key_is_present_and_secret_is_not() {
        let token = Token::new("visible-token", "super-hidden-secret");
        let header = signer()
            .authorization_header_at(
                "POST",
                "https://api.example.com/x",
                &[],
                Some(&token),
                "n",
                1,
            )
            .unwrap();
        assert!(header.contains("oauth_token=\"visible-token\""));
        assert!(!header.contains("super-hidden-secret"));
    }

    #[test]
    fn empty_token_key_is_omitted() {
        let token = Token::new("", "secret-only");
        let header = signer()
            .authorization_header_at(
                "POST",
                "https://api.example.com/x",
                &[],
                Some(&token),
                "n",
                1,
            )
            .unwrap();
        assert!(!header.contains("oauth_token="));
    }

    #[test]
    fn missing_consumer_credentials_fail_fast() {
        let err = Signer::new("", "")
            .authorization_header("POST", "https://api.example.com/x", &[], None)
            .unwrap_err();
        assert_eq!(err, OauthError::MissingCredentials);
    }

    #[test]
    fn invalid_urls_are_rejected() {
        let s = signer();
        for bad in ["no-scheme.example.com/x", "https:///path-only", "://host", ""] {
            assert!(
                matches!(
                    s.authorization_header("POST", bad, &[], None),
                    Err(OauthError::InvalidUrl(_))
                ),
                "expected invalid URL error for {bad:?}"
            );
        }
    }

    #[test]
    fn url_normalization() {
        assert_eq!(
            normalize_url("HTTPS://API.Example.COM/Path/Sub?q=1#frag").unwrap(),
            "https://api.example.com/Path/Sub"
        );
        assert_eq!(
            normalize_url("http://example.com").unwrap(),
            "http://example.com/"
        );
        assert_eq!(
            normalize_url("http://example.com?q=1").unwrap(),
            "http://example.com/"
        );
    }

    #[test]
    fn method_is_uppercased_in_base_string() {
        let a = signer()
            .authorization_header_at("post", "https://api.example.com/x", &[], None, "n", 1)
            .unwrap();
        let b = signer()
            .authorization_header_at("POST", "https://api.example.com/x", &[], None, "n", 1)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn header_lists_params_sorted_by_key() {
        let header = signer()
            .authorization_header_at("POST", "https://api.example.com/x", &[], None, "n", 1)
            .unwrap();
        let keys: Vec<&str> = header
            .strip_prefix("OAuth ")
            .unwrap()
            .split(", ")
            .map(|p| p.split('=').next().unwrap())
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert!(keys.contains(&"oauth_signature"));
    }

    #[test]
    fn body_values_with_reserved_chars_are_encoded_in_param_string() {
        let body = form(&[("title", "a b&c=d")]);
        // Signing must not fail and the header itself never carries body params.
        let header = signer()
            .authorization_header_at("POST", "https://api.example.com/x", &body, None, "n", 1)
            .unwrap();
        assert!(!header.contains("title"));
    }
}
