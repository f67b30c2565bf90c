//! USSD Code Generation
//!
//! When a deposit answer carries neither a USSD code nor a payment link,
//! the client can build the dial string itself for the networks that run
//! in "connect" mode. The templates live in a table keyed by
//! `(provider, country, api mode)`:
//!
//! | Provider | Country | Mode    | Template                          |
//! |----------|---------|---------|-----------------------------------|
//! | Moov     | any     | connect | `*155*2*1*{merchant}*{net}#`      |
//! | Orange   | any     | connect | `*144*2*1*{merchant}*{amount}#`   |
//!
//! `net` is the amount minus a fee of `ceil(amount * bps / 10000)`.

use crate::types::{Amount, Network, Settings};
use std::fmt;

// =============================================================================
// Keys
// =============================================================================

/// Mobile-money provider recognized from the network name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Moov,
    Orange,
}

impl Provider {
    /// Case-insensitive match on the network's name, then its public name
    pub fn from_network(network: &Network) -> Option<Self> {
        Self::from_name(&network.name).or_else(|| Self::from_name(&network.public_name))
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.contains("moov") {
            Some(Provider::Moov)
        } else if name.contains("orange") {
            Some(Provider::Orange)
        } else {
            None
        }
    }

    /// Key used in the settings' merchant table
    pub fn key(&self) -> &'static str {
        match self {
            Provider::Moov => "moov",
            Provider::Orange => "orange",
        }
    }

    pub fn brand(&self) -> &'static str {
        match self {
            Provider::Moov => "Moov Money",
            Provider::Orange => "Orange Money",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.brand())
    }
}

/// Deposit integration mode of a network (`deposit_api`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMode {
    Connect,
    Standard,
}

impl ApiMode {
    pub fn from_network(network: &Network) -> Self {
        match network.deposit_api.as_deref().map(str::trim) {
            Some(mode) if mode.eq_ignore_ascii_case("connect") => ApiMode::Connect,
            _ => ApiMode::Standard,
        }
    }
}

/// Country part of a table key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountryKey {
    Any,
    Code(&'static str),
}

impl CountryKey {
    fn matches(&self, country_code: &str) -> bool {
        match self {
            CountryKey::Any => true,
            CountryKey::Code(code) => *code == country_code,
        }
    }
}

// =============================================================================
// Strategy Table
// =============================================================================

/// Values a template is rendered from
#[derive(Debug, Clone, Copy)]
pub struct UssdInput<'a> {
    pub merchant: &'a str,
    pub amount: Amount,
    pub fee_basis_points: u32,
}

pub struct UssdStrategy {
    pub provider: Provider,
    pub country: CountryKey,
    pub mode: ApiMode,
    /// Amount the template dials, given the input
    pub dialed_amount: fn(&UssdInput) -> Amount,
    pub template: fn(&UssdInput) -> String,
}

pub const STRATEGIES: &[UssdStrategy] = &[
    UssdStrategy {
        provider: Provider::Moov,
        country: CountryKey::Any,
        mode: ApiMode::Connect,
        dialed_amount: moov_net,
        template: moov_template,
    },
    UssdStrategy {
        provider: Provider::Orange,
        country: CountryKey::Any,
        mode: ApiMode::Connect,
        dialed_amount: raw_amount,
        template: orange_template,
    },
];

fn moov_net(input: &UssdInput) -> Amount {
    net_amount(input.amount, input.fee_basis_points)
}

fn raw_amount(input: &UssdInput) -> Amount {
    input.amount
}

fn moov_template(input: &UssdInput) -> String {
    format!("*155*2*1*{}*{}#", input.merchant, moov_net(input))
}

fn orange_template(input: &UssdInput) -> String {
    format!("*144*2*1*{}*{}#", input.merchant, input.amount)
}

/// First table entry for the key
pub fn find_strategy(provider: Provider, country_code: &str, mode: ApiMode) -> Option<&'static UssdStrategy> {
    STRATEGIES
        .iter()
        .find(|s| s.provider == provider && s.mode == mode && s.country.matches(country_code))
}

/// Fee retained by the provider, rounded up to the next franc
pub fn fee(amount: Amount, basis_points: u32) -> Amount {
    let scaled = u128::from(amount) * u128::from(basis_points);
    let fee = scaled.div_ceil(10_000);
    Amount::try_from(fee).unwrap_or(Amount::MAX)
}

pub fn net_amount(amount: Amount, basis_points: u32) -> Amount {
    amount.saturating_sub(fee(amount, basis_points))
}

// =============================================================================
// Computation
// =============================================================================

/// A USSD code computed on the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUssd {
    pub provider: Provider,
    pub code: String,
    pub merchant: String,
    /// Amount encoded in the code (net of fees for Moov)
    pub dialed_amount: Amount,
}

impl ProviderUssd {
    pub fn tel_uri(&self) -> String {
        tel_uri(&self.code)
    }
}

/// Build the USSD code for a deposit on `network`.
///
/// Returns `None` when the network is not a recognized provider, is not
/// in connect mode, has no country code, or has no merchant number for
/// its country in `settings`.
pub fn compute_ussd(network: &Network, amount: Amount, settings: &Settings) -> Option<ProviderUssd> {
    let provider = Provider::from_network(network)?;
    let mode = ApiMode::from_network(network);
    let country = network.country_code.as_deref().map(str::trim)?;
    let strategy = find_strategy(provider, country, mode)?;
    let merchant = settings.merchant_phone(provider.key(), country)?;

    let input = UssdInput {
        merchant,
        amount,
        fee_basis_points: settings.fee_basis_points(),
    };
    Some(ProviderUssd {
        provider,
        code: (strategy.template)(&input),
        merchant: merchant.to_string(),
        dialed_amount: (strategy.dialed_amount)(&input),
    })
}

/// `tel:` URI for a dial string
pub fn tel_uri(code: &str) -> String {
    format!("tel:{}", code.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn network(name: &str, mode: Option<&str>, country: Option<&str>) -> Network {
        Network {
            id: 1,
            name: name.into(),
            public_name: String::new(),
            image: None,
            country_code: country.map(String::from),
            active_for_deposit: true,
            active_for_with: true,
            deposit_api: mode.map(String::from),
            payment_by_link: false,
            deposit_message: None,
            withdrawal_message: None,
        }
    }

    fn settings() -> Settings {
        let mut merchant_phones = BTreeMap::new();
        merchant_phones.insert(
            "moov".to_string(),
            [("229".to_string(), "22960000001".to_string())].into_iter().collect(),
        );
        merchant_phones.insert(
            "orange".to_string(),
            [("225".to_string(), "2250700000001".to_string())].into_iter().collect(),
        );
        Settings {
            referral_bonus: false,
            merchant_phones,
            fee_basis_points: None,
        }
    }

    #[test]
    fn test_moov_connect_deducts_fee() {
        let ussd = compute_ussd(&network("MOOV BENIN", Some("connect"), Some("229")), 10_000, &settings())
            .unwrap();
        assert_eq!(ussd.provider, Provider::Moov);
        assert_eq!(ussd.code, "*155*2*1*22960000001*9900#");
        assert_eq!(ussd.dialed_amount, 9900);
        assert_eq!(ussd.tel_uri(), "tel:*155*2*1*22960000001*9900#");
    }

    #[test]
    fn test_orange_connect_uses_raw_amount() {
        let ussd = compute_ussd(&network("orange ci", Some("Connect"), Some("225")), 10_000, &settings())
            .unwrap();
        assert_eq!(ussd.code, "*144*2*1*2250700000001*10000#");
    }

    #[test]
    fn test_no_code_without_connect_or_merchant() {
        let s = settings();
        assert!(compute_ussd(&network("Moov", None, Some("229")), 10_000, &s).is_none());
        assert!(compute_ussd(&network("Moov", Some("connect"), Some("226")), 10_000, &s).is_none());
        assert!(compute_ussd(&network("Moov", Some("connect"), None), 10_000, &s).is_none());
        assert!(compute_ussd(&network("MTN", Some("connect"), Some("229")), 10_000, &s).is_none());
    }

    #[test]
    fn test_fee_rounds_up() {
        assert_eq!(fee(10_000, 100), 100);
        assert_eq!(fee(1_050, 100), 11);
        assert_eq!(fee(1, 100), 1);
        assert_eq!(fee(0, 100), 0);
        assert_eq!(net_amount(1_050, 100), 1_039);
        assert_eq!(fee(10_000, 250), 250);
    }

    #[test]
    fn test_custom_fee_from_settings() {
        let mut s = settings();
        s.fee_basis_points = Some(200);
        let ussd = compute_ussd(&network("Moov", Some("connect"), Some("229")), 10_000, &s).unwrap();
        assert_eq!(ussd.code, "*155*2*1*22960000001*9800#");
    }
}
