//! Client Configuration
//!
//! Layered configuration for the iCASH client:
//! - Built-in defaults
//! - Optional JSON file
//! - Environment overrides (`ICASH_*`)

use crate::error::{IcashError, IcashResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.icash.africa/";
pub const ENV_CONFIG_FILE: &str = "ICASH_CONFIG";
pub const ENV_API_URL: &str = "ICASH_API_URL";
pub const ENV_SOURCE: &str = "ICASH_SOURCE";
pub const ENV_TIMEOUT: &str = "ICASH_TIMEOUT_SECS";
pub const ENV_SESSION_FILE: &str = "ICASH_SESSION_FILE";
pub const ENV_DEBUG: &str = "ICASH_DEBUG";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the REST API
    pub base_url: String,
    /// `source` field sent with transaction requests
    pub source: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    /// Delay between committing a step selection and showing the next step
    pub auto_advance_ms: u64,
    /// Delay before following a `tel:` link
    pub dial_delay_ms: u64,
    /// Delay before routing to the transaction detail after a dial
    pub detail_delay_ms: u64,
    /// Where the session is persisted between CLI runs
    pub session_file: Option<PathBuf>,
    /// Where received push notifications are kept
    pub inbox_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            source: "web".to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: concat!("icash-client/", env!("CARGO_PKG_VERSION")).to_string(),
            auto_advance_ms: 1000,
            dial_delay_ms: 300,
            detail_delay_ms: 800,
            session_file: None,
            inbox_file: None,
        }
    }
}

impl ClientConfig {
    /// Load a configuration file (missing keys fall back to defaults)
    pub fn from_file(path: &Path) -> IcashResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            IcashError::config(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        let config: ClientConfig = serde_json::from_str(&raw).map_err(|e| {
            IcashError::config(format!("Invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then `path` (or `ICASH_CONFIG`), then environment overrides
    pub fn load(path: Option<&Path>) -> IcashResult<Self> {
        let env_path = std::env::var(ENV_CONFIG_FILE).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `ICASH_*` overrides from any key lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> IcashResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.base_url = url;
        }
        if let Some(source) = lookup(ENV_SOURCE) {
            self.source = source;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            self.request_timeout_secs = timeout.trim().parse().map_err(|_| {
                IcashError::config(format!("{} must be a number of seconds", ENV_TIMEOUT))
            })?;
        }
        if let Some(path) = lookup(ENV_SESSION_FILE) {
            self.session_file = Some(PathBuf::from(path));
        }
        self.validate()
    }

    pub fn validate(&self) -> IcashResult<()> {
        let url = self.api_url()?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(IcashError::config(format!(
                "Unsupported API URL scheme: {}",
                url.scheme()
            )));
        }
        if self.source.trim().is_empty() {
            return Err(IcashError::config("Transaction source cannot be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(IcashError::config("Request timeout must be positive"));
        }
        Ok(())
    }

    pub fn api_url(&self) -> IcashResult<Url> {
        Ok(Url::parse(&self.base_url)?)
    }

    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_ms)
    }

    pub fn dial_delay(&self) -> Duration {
        Duration::from_millis(self.dial_delay_ms)
    }

    pub fn detail_delay(&self) -> Duration {
        Duration::from_millis(self.detail_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.auto_advance_delay(), Duration::from_secs(1));
        assert_eq!(config.source, "web");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://localhost:8000/api/"),
            (ENV_TIMEOUT, "5"),
            (ENV_SOURCE, "cli"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config
            .apply_env_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.base_url, "http://localhost:8000/api/");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.source, "cli");
    }

    #[test]
    fn test_bad_env_timeout_rejected() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_env_from(|k| (k == ENV_TIMEOUT).then(|| "soon".to_string()))
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigError);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icash.json");
        std::fs::write(&path, r#"{"base_url": "https://staging.icash.africa/", "auto_advance_ms": 0}"#)
            .unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.base_url, "https://staging.icash.africa/");
        assert_eq!(config.auto_advance_ms, 0);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_scheme_rejected() {
        let config = ClientConfig {
            base_url: "ftp://icash.africa".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
