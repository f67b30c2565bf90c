//! HTTP Client Construction
//!
//! Builds the blocking reqwest client the API layer uses, with:
//! - Connection pooling and keepalive
//! - Request and connect timeouts from configuration
//! - URL joining and query-string encoding helpers

use reqwest::blocking::Client;
use std::time::Duration;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{IcashError, IcashResult};

/// Build the HTTP client for a configuration
pub fn build_client(config: &ClientConfig) -> IcashResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(5)
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| IcashError::network(format!("Failed to create HTTP client: {}", e)))
}

/// Join an API path onto the base URL, keeping the base's own path prefix
pub fn join_url(base: &Url, path: &str) -> IcashResult<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}

/// Encode `key=value` pairs, skipping empty values
pub fn query_string(params: &[(&str, String)]) -> String {
    params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_keeps_prefix() {
        let base = Url::parse("https://api.example.com/prod").unwrap();
        let url = join_url(&base, "/transaction-history").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/prod/transaction-history");

        let base = Url::parse("https://api.example.com/").unwrap();
        let url = join_url(&base, "user-phone/12/").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/user-phone/12/");
    }

    #[test]
    fn test_query_string_encodes_and_skips_empty() {
        let qs = query_string(&[
            ("page", "2".to_string()),
            ("search", "ref 42&x".to_string()),
            ("status", String::new()),
        ]);
        assert_eq!(qs, "page=2&search=ref%2042%26x");
    }

    #[test]
    fn test_client_creation() {
        let client = build_client(&ClientConfig::default()).unwrap();
        assert!(client.get("https://example.com").build().is_ok());
    }
}
