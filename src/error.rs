//! Unified error types for the iCASH client
//!
//! All errors flow through this module so callers (the wizard, the CLI)
//! can decide how to surface them: inline, in a modal or as a toast.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all iCASH operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcashError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl IcashError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg)
    }

    pub fn currency_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CurrencyMismatch, msg)
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, msg)
    }

    pub fn api(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiError, msg)
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimited, msg)
    }

    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthError, msg)
    }

    pub fn session_expired(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SessionExpired, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, msg)
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidState, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// Whether the failure came from the user's input rather than the server
    pub fn is_client_side(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::InvalidInput
                | ErrorCode::Validation
                | ErrorCode::NotFound
                | ErrorCode::CurrencyMismatch
                | ErrorCode::InvalidState
        )
    }
}

impl fmt::Display for IcashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for IcashError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidInput,
    Validation,

    // Lookup errors
    NotFound,
    CurrencyMismatch,

    // Authentication errors
    AuthError,
    SessionExpired,

    // Network errors
    NetworkError,
    RateLimited,
    Timeout,
    ApiError,

    // Parse errors
    ParseError,
    JsonError,

    // Local errors
    ConfigError,
    InvalidState,
    Internal,
}

/// Result type alias for iCASH operations
pub type IcashResult<T> = Result<T, IcashError>;

// Conversions from common error types

impl From<serde_json::Error> for IcashError {
    fn from(e: serde_json::Error) -> Self {
        IcashError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<std::io::Error> for IcashError {
    fn from(e: std::io::Error) -> Self {
        IcashError::new(ErrorCode::Internal, e.to_string())
    }
}

impl From<url::ParseError> for IcashError {
    fn from(e: url::ParseError) -> Self {
        IcashError::new(ErrorCode::ConfigError, format!("Invalid URL: {}", e))
    }
}

impl From<reqwest::Error> for IcashError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            IcashError::new(ErrorCode::Timeout, "Request timed out")
        } else if e.is_connect() {
            IcashError::new(ErrorCode::NetworkError, "Connection failed")
        } else if e.is_decode() {
            IcashError::new(ErrorCode::ParseError, e.to_string())
        } else {
            IcashError::new(ErrorCode::NetworkError, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = IcashError::rate_limited("Veuillez patienter 2 minutes")
            .with_details("POST /transaction-deposit");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("rate_limited"));
        assert!(json.contains("2 minutes"));
    }

    #[test]
    fn test_display_includes_details() {
        let err = IcashError::not_found("Utilisateur non trouvé").with_details("bet id 42");
        assert_eq!(err.to_string(), "[NotFound] Utilisateur non trouvé (bet id 42)");
    }

    #[test]
    fn test_client_side_classification() {
        assert!(IcashError::validation("amount").is_client_side());
        assert!(IcashError::currency_mismatch("XOF").is_client_side());
        assert!(!IcashError::network("down").is_client_side());
        assert!(!IcashError::rate_limited("wait").is_client_side());
    }
}
