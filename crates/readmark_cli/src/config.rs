//! JSON config store.
//!
//! Holds the API base, consumer credentials, the stored access token,
//! and per-user defaults. The file lives under the platform config
//! directory and is written atomically; a missing file yields defaults.

use crate::report::CliError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Base URL of the hosted service.
pub const DEFAULT_API_BASE: &str = "https://api.readmark.net";

/// Environment variable overriding the consumer key.
pub const ENV_CONSUMER_KEY: &str = "READMARK_CONSUMER_KEY";
/// Environment variable overriding the consumer secret.
pub const ENV_CONSUMER_SECRET: &str = "READMARK_CONSUMER_SECRET";

/// The account the stored token belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Server-assigned user id.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub user_id: i64,
    /// Account name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
}

/// Per-user defaults applied when flags are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDefaults {
    /// Default list limit; 0 means fetch everything.
    #[serde(default)]
    pub list_limit: i64,
    /// Default output format name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub format: String,
}

/// On-disk configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API base URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_base: String,
    /// OAuth consumer key.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub consumer_key: String,
    /// OAuth consumer secret.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub consumer_secret: String,
    /// Stored access token.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub oauth_token: String,
    /// Stored access token secret.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub oauth_token_secret: String,
    /// Account the token belongs to.
    #[serde(default)]
    pub user: UserInfo,
    /// Flag defaults.
    #[serde(default)]
    pub defaults: ConfigDefaults,
}

impl Config {
    /// Configuration used when no file exists yet.
    pub fn default_config() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            defaults: ConfigDefaults {
                list_limit: 0,
                format: "ndjson".to_string(),
            },
            ..Default::default()
        }
    }

    /// Loads the config from `path`; a missing or empty file yields the
    /// defaults, a present but unparseable file is an error.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default_config())
            }
            Err(err) => return Err(err.into()),
        };
        if bytes.is_empty() {
            return Ok(Self::default_config());
        }
        let mut config: Config = serde_json::from_slice(&bytes)
            .map_err(|e| CliError::Config(format!("parse config {}: {e}", path.display())))?;
        if config.api_base.is_empty() {
            config.api_base = DEFAULT_API_BASE.to_string();
        }
        if config.defaults.list_limit < 0 {
            config.defaults.list_limit = 0;
        }
        if config.defaults.format.is_empty() {
            config.defaults.format = "ndjson".to_string();
        }
        Ok(config)
    }

    /// Writes the config atomically: temp file, rename, with a
    /// remove-then-rename fallback.
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let mut bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| CliError::Config(e.to_string()))?;
        bytes.push(b'\n');

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)?;
        if fs::rename(&tmp, path).is_err() {
            let _ = fs::remove_file(path);
            if let Err(err) = fs::rename(&tmp, path) {
                let _ = fs::remove_file(&tmp);
                return Err(err.into());
            }
        }
        Ok(())
    }

    /// True when an access token is stored.
    pub fn has_auth(&self) -> bool {
        !self.oauth_token.is_empty() && !self.oauth_token_secret.is_empty()
    }

    /// Forgets the stored token and account.
    pub fn clear_auth(&mut self) {
        self.oauth_token.clear();
        self.oauth_token_secret.clear();
        self.user = UserInfo::default();
    }

    /// Consumer credentials, environment taking precedence over the
    /// stored values.
    pub fn consumer_credentials(&self) -> (String, String) {
        let key = std::env::var(ENV_CONSUMER_KEY)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.consumer_key.clone());
        let secret = std::env::var(ENV_CONSUMER_SECRET)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.consumer_secret.clone());
        (key, secret)
    }

    /// Reads one dotted config key for `config get`.
    pub fn get_key(&self, key: &str) -> Result<serde_json::Value, CliError> {
        let value = match key {
            "api_base" => serde_json::json!(self.api_base),
            "consumer_key" => serde_json::json!(self.consumer_key),
            "defaults.list_limit" => serde_json::json!(self.defaults.list_limit),
            "defaults.format" => serde_json::json!(self.defaults.format),
            _ => return Err(CliError::Usage(format!("unknown config key: {key}"))),
        };
        Ok(value)
    }

    /// Sets one dotted config key for `config set`.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<(), CliError> {
        match key {
            "api_base" => self.api_base = value.to_string(),
            "consumer_key" => self.consumer_key = value.to_string(),
            "consumer_secret" => self.consumer_secret = value.to_string(),
            "defaults.list_limit" => {
                let parsed: i64 = value
                    .parse()
                    .map_err(|_| CliError::Usage(format!("invalid number: {value}")))?;
                if !(0..=crate::MAX_LIST_LIMIT).contains(&parsed) {
                    return Err(CliError::Usage(format!(
                        "invalid defaults.list_limit {parsed} (expected 0..={})",
                        crate::MAX_LIST_LIMIT
                    )));
                }
                self.defaults.list_limit = parsed;
            }
            "defaults.format" => {
                crate::output::parse_format(value)?;
                self.defaults.format = value.to_string();
            }
            _ => return Err(CliError::Usage(format!("unknown config key: {key}"))),
        }
        Ok(())
    }

    /// Clears one dotted config key for `config unset`.
    pub fn unset_key(&mut self, key: &str) -> Result<(), CliError> {
        match key {
            "api_base" => self.api_base = DEFAULT_API_BASE.to_string(),
            "consumer_key" => self.consumer_key.clear(),
            "consumer_secret" => self.consumer_secret.clear(),
            "defaults.list_limit" => self.defaults.list_limit = 0,
            "defaults.format" => self.defaults.format = "ndjson".to_string(),
            _ => return Err(CliError::Usage(format!("unknown config key: {key}"))),
        }
        Ok(())
    }

    /// Copy with secrets masked, for `config show`.
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::json!({
            "api_base": self.api_base,
            "consumer_key": self.consumer_key,
            "consumer_secret": mask(&self.consumer_secret),
            "oauth_token": mask(&self.oauth_token),
            "oauth_token_secret": mask(&self.oauth_token_secret),
            "user": self.user,
            "defaults": self.defaults,
        })
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "****".to_string()
    }
}

/// Default config file path under the platform config directory.
pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("readmark").join("config.json"))
        .ok_or_else(|| CliError::Config("cannot determine config directory".into()))
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}
