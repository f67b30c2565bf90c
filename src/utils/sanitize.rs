//! Input Sanitization
//!
//! Cleans free-text form input before it is validated or sent:
//! - Whitespace trimming and collapsing
//! - Unicode normalization (NFC)
//! - Control character removal
//! - Length limits

use crate::error::{IcashError, IcashResult};
use unicode_normalization::UnicodeNormalization;

/// Maximum length for various input types
pub mod limits {
    /// Maximum bet ID length
    pub const MAX_BET_ID_LENGTH: usize = 64;
    /// Maximum first/last name length
    pub const MAX_NAME_LENGTH: usize = 150;
    /// Maximum email length
    pub const MAX_EMAIL_LENGTH: usize = 254;
    /// Maximum history search term length
    pub const MAX_SEARCH_LENGTH: usize = 100;
    /// Maximum referral code length
    pub const MAX_REFERRAL_LENGTH: usize = 32;
}

/// Sanitization result
#[derive(Debug, Clone)]
pub struct SanitizeResult<T> {
    pub value: T,
    pub was_modified: bool,
    pub modifications: Vec<String>,
}

impl<T> SanitizeResult<T> {
    pub fn unchanged(value: T) -> Self {
        Self {
            value,
            was_modified: false,
            modifications: Vec::new(),
        }
    }

    pub fn modified(value: T, modifications: Vec<String>) -> Self {
        Self {
            value,
            was_modified: true,
            modifications,
        }
    }
}

/// Sanitization options
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    pub trim: bool,
    pub normalize_unicode: bool,
    pub remove_control_chars: bool,
    pub collapse_whitespace: bool,
    pub max_length: Option<usize>,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            trim: true,
            normalize_unicode: true,
            remove_control_chars: true,
            collapse_whitespace: false,
            max_length: None,
        }
    }
}

impl SanitizeOptions {
    /// Options for person names
    pub fn for_name() -> Self {
        Self {
            collapse_whitespace: true,
            max_length: Some(limits::MAX_NAME_LENGTH),
            ..Default::default()
        }
    }

    /// Options for identifiers typed by the user (bet IDs, referral codes)
    pub fn for_identifier(max_length: usize) -> Self {
        Self {
            normalize_unicode: false,
            collapse_whitespace: true,
            max_length: Some(max_length),
            ..Default::default()
        }
    }

    /// Options for search boxes
    pub fn for_search() -> Self {
        Self {
            collapse_whitespace: true,
            max_length: Some(limits::MAX_SEARCH_LENGTH),
            ..Default::default()
        }
    }
}

/// Sanitize a string with configurable options
pub fn sanitize_string(input: &str, options: &SanitizeOptions) -> SanitizeResult<String> {
    let mut result = input.to_string();
    let mut modifications = Vec::new();

    if options.trim {
        let trimmed = result.trim();
        if trimmed.len() != result.len() {
            modifications.push("Trimmed whitespace".to_string());
            result = trimmed.to_string();
        }
    }

    if options.normalize_unicode {
        let normalized: String = result.nfc().collect();
        if normalized != result {
            modifications.push("Normalized Unicode".to_string());
            result = normalized;
        }
    }

    if options.remove_control_chars {
        let cleaned: String = result.chars().filter(|c| !c.is_control()).collect();
        if cleaned != result {
            modifications.push("Removed control characters".to_string());
            result = cleaned;
        }
    }

    if options.collapse_whitespace {
        let collapsed = result.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed != result {
            modifications.push("Collapsed whitespace".to_string());
            result = collapsed;
        }
    }

    if let Some(max_len) = options.max_length {
        if result.chars().count() > max_len {
            result = result.chars().take(max_len).collect();
            modifications.push(format!("Truncated to {} characters", max_len));
        }
    }

    if modifications.is_empty() {
        SanitizeResult::unchanged(result)
    } else {
        SanitizeResult::modified(result, modifications)
    }
}

/// Sanitize a bet ID; must be non-empty and free of inner whitespace
pub fn sanitize_bet_id(bet_id: &str) -> IcashResult<String> {
    let result = sanitize_string(
        bet_id,
        &SanitizeOptions::for_identifier(limits::MAX_BET_ID_LENGTH),
    );
    let value = result.value;

    if value.is_empty() {
        return Err(IcashError::validation("Veuillez entrer un ID de pari"));
    }
    if value.contains(char::is_whitespace) {
        return Err(IcashError::validation("L'ID de pari ne doit pas contenir d'espaces"));
    }
    Ok(value)
}

/// Sanitize a person name
pub fn sanitize_name(name: &str) -> String {
    sanitize_string(name, &SanitizeOptions::for_name()).value
}

/// Sanitize a history search term
pub fn sanitize_search(term: &str) -> String {
    sanitize_string(term, &SanitizeOptions::for_search()).value
}

/// Lightweight email shape check: one `@`, non-empty local part, dotted domain
pub fn validate_email(email: &str) -> IcashResult<String> {
    let email = email.trim();
    if email.len() > limits::MAX_EMAIL_LENGTH {
        return Err(IcashError::validation("Email invalide"));
    }
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(IcashError::validation("Email invalide")),
    };
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains(char::is_whitespace);
    if local.is_empty() || local.contains(char::is_whitespace) || !domain_ok {
        return Err(IcashError::validation("Email invalide"));
    }
    Ok(email.to_lowercase())
}
