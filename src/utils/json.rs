//! JSON Parsing Utilities
//!
//! Lenient decoding for the shapes the iCASH API actually sends:
//! amounts as numbers or decimal strings, messages as strings or lists.

use crate::error::{IcashError, IcashResult};
use serde::de::{DeserializeOwned, Deserializer, Error as DeError};
use serde::Deserialize;

/// Safely parse JSON string into a type
pub fn parse_json<T: DeserializeOwned>(json_str: &str) -> IcashResult<T> {
    serde_json::from_str(json_str)
        .map_err(|e| IcashError::parse_error(format!("JSON parse error: {}", e)))
}

/// How a fractional amount becomes whole FCFA
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Nearest,
    /// Lower bounds: never accept less than the server does
    Up,
    /// Upper bounds: never accept more than the server does
    Down,
}

impl Rounding {
    fn apply(self, f: f64) -> f64 {
        match self {
            Rounding::Nearest => f.round(),
            Rounding::Up => f.ceil(),
            Rounding::Down => f.floor(),
        }
    }
}

/// Extract a whole amount from a JSON value (number or decimal string)
pub fn json_amount(value: &serde_json::Value) -> Option<u64> {
    json_amount_rounded(value, Rounding::Nearest)
}

pub fn json_amount_rounded(value: &serde_json::Value, rounding: Rounding) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    if let Some(f) = value.as_f64() {
        return whole(f, rounding);
    }
    value.as_str().and_then(|s| parse_amount_str(s, rounding))
}

/// Parse `"1000"`, `"1000.00"` or `"1 000"` into whole FCFA
pub fn parse_amount_str(s: &str, rounding: Rounding) -> Option<u64> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(n) = cleaned.parse::<u64>() {
        return Some(n);
    }
    cleaned.parse::<f64>().ok().and_then(|f| whole(f, rounding))
}

fn whole(f: f64, rounding: Rounding) -> Option<u64> {
    (f >= 0.0 && f.is_finite()).then(|| rounding.apply(f) as u64)
}

/// First message of a field that may hold a string or a list of strings
pub fn first_message(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => items.iter().find_map(first_message),
        serde_json::Value::Object(map) => map.values().find_map(first_message),
        _ => None,
    }
}

fn de_amount_with<'de, D>(deserializer: D, rounding: Rounding) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    json_amount_rounded(&value, rounding)
        .ok_or_else(|| D::Error::custom(format!("invalid amount: {}", value)))
}

/// `deserialize_with` helper for required amounts
pub fn de_amount<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    de_amount_with(deserializer, Rounding::Nearest)
}

/// `deserialize_with` helper for minimum bounds (rounded up)
pub fn de_min_amount<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    de_amount_with(deserializer, Rounding::Up)
}

/// `deserialize_with` helper for maximum bounds (rounded down)
pub fn de_max_amount<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    de_amount_with(deserializer, Rounding::Down)
}

/// `deserialize_with` helper for optional amounts (`null` allowed)
pub fn de_opt_amount<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    json_amount(&value)
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("invalid amount: {}", value)))
}
