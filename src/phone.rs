//! Phone Numbers
//!
//! Stored numbers are the 3-digit country code followed by the local
//! number, digits only (`22997000000`). Input is cleaned of whitespace,
//! must be digits and at most 10 digits long.

use crate::api::PhoneApi;
use crate::error::{IcashError, IcashResult};
use crate::types::UserPhone;
use crate::log_info;
use thiserror::Error;

/// Longest local part accepted after the country code
pub const MAX_LOCAL_DIGITS: usize = 10;

/// Country served by iCASH
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
}

pub const SUPPORTED_COUNTRIES: &[Country] = &[
    Country { code: "225", name: "Côte d'Ivoire" },
    Country { code: "229", name: "Bénin" },
    Country { code: "221", name: "Sénégal" },
    Country { code: "226", name: "Burkina Faso" },
];

pub fn country(code: &str) -> Option<&'static Country> {
    SUPPORTED_COUNTRIES.iter().find(|c| c.code == code)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    #[error("Veuillez entrer un numéro de téléphone")]
    Empty,
    #[error("Le numéro ne doit contenir que des chiffres")]
    NotDigits,
    #[error("Le numéro ne doit pas dépasser 10 chiffres")]
    TooLong,
    #[error("Pays non pris en charge: {0}")]
    UnsupportedCountry(String),
}

impl From<PhoneError> for IcashError {
    fn from(err: PhoneError) -> Self {
        match err {
            PhoneError::UnsupportedCountry(_) => IcashError::invalid_input(err.to_string()),
            _ => IcashError::validation(err.to_string()),
        }
    }
}

/// Strip whitespace, a leading `+` and a leading `00`
pub fn normalize_phone(input: &str) -> String {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let without_plus = compact.strip_prefix('+').unwrap_or(&compact);
    without_plus
        .strip_prefix("00")
        .unwrap_or(without_plus)
        .to_string()
}

/// Clean and check the local part typed by the user
pub fn validate_local_number(input: &str) -> Result<String, PhoneError> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(PhoneError::Empty);
    }
    if !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(PhoneError::NotDigits);
    }
    if cleaned.len() > MAX_LOCAL_DIGITS {
        return Err(PhoneError::TooLong);
    }
    Ok(cleaned)
}

/// Full number for storage: country code + validated local part
pub fn compose(country_code: &str, local: &str) -> Result<String, PhoneError> {
    if country(country_code).is_none() {
        return Err(PhoneError::UnsupportedCountry(country_code.to_string()));
    }
    let local = validate_local_number(local)?;
    Ok(format!("{}{}", country_code, local))
}

/// Split a stored number back into (country code, local part)
pub fn split_phone(stored: &str) -> (String, String) {
    let normalized = normalize_phone(stored);
    if normalized.len() > 3 && normalized.is_char_boundary(3) {
        let (code, local) = normalized.split_at(3);
        (code.to_string(), local.to_string())
    } else {
        (String::new(), normalized)
    }
}

// =============================================================================
// Phone Book
// =============================================================================

/// The user's registered numbers, backed by the phone API
pub struct PhoneBook<'a, A: PhoneApi> {
    api: &'a A,
}

impl<'a, A: PhoneApi> PhoneBook<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    pub fn all(&self) -> IcashResult<Vec<UserPhone>> {
        self.api.phones()
    }

    /// Numbers registered for one network
    pub fn for_network(&self, network_id: u64) -> IcashResult<Vec<UserPhone>> {
        Ok(self
            .api
            .phones()?
            .into_iter()
            .filter(|p| p.network == network_id)
            .collect())
    }

    pub fn add(&self, country_code: &str, local: &str, network_id: u64) -> IcashResult<UserPhone> {
        let phone = compose(country_code, local)?;
        let created = self.api.create_phone(&phone, network_id)?;
        log_info!("phone", "Phone registered", id = created.id, network = network_id);
        Ok(created)
    }

    pub fn update(&self, id: u64, country_code: &str, local: &str, network_id: u64) -> IcashResult<UserPhone> {
        let phone = compose(country_code, local)?;
        self.api.update_phone(id, &phone, network_id)
    }

    pub fn remove(&self, id: u64) -> IcashResult<()> {
        self.api.delete_phone(id)?;
        log_info!("phone", "Phone removed", id = id);
        Ok(())
    }
}
