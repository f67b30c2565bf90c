//! API Error Decoding
//!
//! Maps non-2xx responses to `IcashError`. The server answers with
//! field-keyed bodies (`{"phone": ["..."]}`), a `detail` string, or an
//! `error_time_message` when a cooldown is active.

use crate::error::{ErrorCode, IcashError};
use crate::utils::json::first_message;

/// Fields checked first, in order, when picking the message to show
const PRIORITY_FIELDS: &[&str] = &[
    "detail",
    "error",
    "message",
    "non_field_errors",
    "user_app_id",
    "userid",
    "app_id",
    "phone",
    "network",
    "user",
    "otp",
    "email",
    "password",
    "amount",
];

/// Decode an error response into an `IcashError`
pub fn decode_error(status: u16, body: &str) -> IcashError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    if let Some(ref value) = parsed {
        if let Some(wait) = value.get("error_time_message").and_then(first_message) {
            return IcashError::rate_limited(wait).with_details(format!("HTTP {}", status));
        }
    }

    let (field, message) = parsed
        .as_ref()
        .and_then(pick_message)
        .map(|(f, m)| (Some(f), m))
        .unwrap_or_else(|| (None, default_message(status).to_string()));

    let code = match status {
        401 | 403 => ErrorCode::AuthError,
        404 => ErrorCode::NotFound,
        429 => ErrorCode::RateLimited,
        400..=499 => ErrorCode::ApiError,
        _ => ErrorCode::NetworkError,
    };

    let details = match field {
        Some(f) => format!("HTTP {} ({})", status, f),
        None => format!("HTTP {}", status),
    };
    IcashError::new(code, message).with_details(details)
}

fn pick_message(value: &serde_json::Value) -> Option<(String, String)> {
    let object = value.as_object()?;

    for field in PRIORITY_FIELDS {
        if let Some(message) = object.get(*field).and_then(first_message) {
            return Some((field.to_string(), message));
        }
    }
    object
        .iter()
        .find_map(|(k, v)| first_message(v).map(|m| (k.clone(), m)))
}

fn default_message(status: u16) -> &'static str {
    match status {
        401 => "Session expirée, veuillez vous reconnecter",
        403 => "Accès refusé",
        404 => "Ressource introuvable",
        429 => "Trop de requêtes, veuillez patienter",
        400..=499 => "Requête invalide",
        _ => "Erreur du serveur, veuillez réessayer",
    }
}
