//! Shared types for the iCASH client
//!
//! All data structures exchanged with the iCASH REST API are defined here.
//! Field names follow the server's JSON, including its spellings
//! (`minimun_deposit`, `withdriwal_code`, `net_payable_amout`).

use crate::utils::json::{de_amount, de_max_amount, de_min_amount, de_opt_amount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Amounts are whole FCFA (XOF has no minor unit)
pub type Amount = u64;

/// Currency id the betting platforms use for XOF
pub const XOF_CURRENCY_ID: i64 = 27;

// =============================================================================
// Transaction Kind
// =============================================================================

/// Direction of a wizard session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "Dépôt",
            TransactionKind::Withdrawal => "Retrait",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deposit" | "depot" | "dépôt" => Ok(TransactionKind::Deposit),
            "withdrawal" | "withdraw" | "retrait" => Ok(TransactionKind::Withdrawal),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

// =============================================================================
// Catalog Types
// =============================================================================

/// Betting platform that receives deposits or pays out withdrawals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub enable: bool,
    #[serde(deserialize_with = "de_min_amount")]
    pub minimun_deposit: Amount,
    #[serde(deserialize_with = "de_max_amount")]
    pub max_deposit: Amount,
    #[serde(deserialize_with = "de_min_amount")]
    pub minimun_with: Amount,
    #[serde(deserialize_with = "de_max_amount")]
    pub max_win: Amount,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub deposit_tuto_link: Option<String>,
    #[serde(default)]
    pub withdrawal_tuto_link: Option<String>,
    #[serde(default)]
    pub why_withdrawal_fail: Option<String>,
}

impl Platform {
    /// Inclusive `(min, max)` bounds for the given direction
    pub fn bounds(&self, kind: TransactionKind) -> (Amount, Amount) {
        match kind {
            TransactionKind::Deposit => (self.minimun_deposit, self.max_deposit),
            TransactionKind::Withdrawal => (self.minimun_with, self.max_win),
        }
    }

    /// Help links shown under the amount step
    pub fn help_links(&self, kind: TransactionKind) -> Vec<(&'static str, &str)> {
        let mut links = Vec::new();
        match kind {
            TransactionKind::Deposit => {
                if let Some(ref link) = self.deposit_tuto_link {
                    links.push(("Tutoriel de dépôt", link.as_str()));
                }
            }
            TransactionKind::Withdrawal => {
                if let Some(ref link) = self.why_withdrawal_fail {
                    links.push(("Pourquoi le retrait échoue ?", link.as_str()));
                }
                if let Some(ref link) = self.withdrawal_tuto_link {
                    links.push(("Tutoriel de retrait", link.as_str()));
                }
            }
        }
        links
    }
}

/// Mobile-money carrier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub public_name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub active_for_deposit: bool,
    #[serde(default)]
    pub active_for_with: bool,
    /// Deposit integration mode, e.g. `"connect"`
    #[serde(default)]
    pub deposit_api: Option<String>,
    #[serde(default)]
    pub payment_by_link: bool,
    #[serde(default)]
    pub deposit_message: Option<String>,
    #[serde(default)]
    pub withdrawal_message: Option<String>,
}

impl Network {
    pub fn is_active_for(&self, kind: TransactionKind) -> bool {
        match kind {
            TransactionKind::Deposit => self.active_for_deposit,
            TransactionKind::Withdrawal => self.active_for_with,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.public_name.trim().is_empty() {
            &self.name
        } else {
            &self.public_name
        }
    }

    /// Operator message for the direction, if any non-blank one is configured
    pub fn message_for(&self, kind: TransactionKind) -> Option<&str> {
        let message = match kind {
            TransactionKind::Deposit => self.deposit_message.as_deref(),
            TransactionKind::Withdrawal => self.withdrawal_message.as_deref(),
        };
        message.filter(|m| !m.trim().is_empty())
    }
}

/// Phone number registered by the user for a network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPhone {
    pub id: u64,
    pub phone: String,
    pub network: u64,
}

/// Bet ID linked to a platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAppId {
    pub id: u64,
    pub user_app_id: String,
    pub app: String,
}

/// Raw answer of the platform's user search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetIdSearch {
    #[serde(rename = "UserId")]
    pub user_id: i64,
    #[serde(rename = "CurrencyId")]
    pub currency_id: i64,
    #[serde(rename = "Name", default)]
    pub name: String,
}

// =============================================================================
// Transaction Types
// =============================================================================

/// Payload of `POST /transaction-deposit` and `POST /transaction-withdrawal`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub amount: Amount,
    pub phone_number: String,
    pub app: String,
    pub user_app_id: String,
    pub network: u64,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub withdriwal_code: Option<String>,
}

/// Answer of the transaction-creation endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: u64,
    #[serde(default)]
    pub transaction_link: Option<String>,
    #[serde(default)]
    pub ussd_code: Option<String>,
}

impl TransactionResponse {
    /// Trimmed USSD code, blank values count as absent
    pub fn ussd(&self) -> Option<&str> {
        self.ussd_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Trimmed payment link, blank values count as absent
    pub fn link(&self) -> Option<&str> {
        self.transaction_link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

/// Server-side transaction status
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    InitPayment,
    Pending,
    Accept,
    Reject,
    Timeout,
    Error,
    #[serde(untagged)]
    Other(String),
}

impl TransactionStatus {
    pub fn label(&self) -> &str {
        match self {
            TransactionStatus::InitPayment => "Paiement initié",
            TransactionStatus::Pending => "En attente",
            TransactionStatus::Accept => "Accepté",
            TransactionStatus::Reject => "Rejeté",
            TransactionStatus::Timeout => "Expiré",
            TransactionStatus::Error => "Erreur",
            TransactionStatus::Other(s) => s.as_str(),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Accept
                | TransactionStatus::Reject
                | TransactionStatus::Timeout
                | TransactionStatus::Error
        )
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, TransactionStatus::InitPayment | TransactionStatus::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Embedded platform summary on history entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDetails {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// History entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    #[serde(default)]
    pub reference: String,
    pub type_trans: TransactionKind,
    pub status: TransactionStatus,
    #[serde(deserialize_with = "de_amount")]
    pub amount: Amount,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub app_details: Option<AppDetails>,
    #[serde(default)]
    pub user_app_id: Option<String>,
    #[serde(default)]
    pub network: Option<u64>,
    #[serde(default)]
    pub transaction_link: Option<String>,
    #[serde(default)]
    pub withdriwal_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub net_payable_amout: Option<Amount>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub deposit_reward_amount: Option<Amount>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub validated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Transaction {
    /// Amount with the direction sign used in lists
    pub fn signed_amount(&self) -> String {
        let sign = match self.type_trans {
            TransactionKind::Deposit => "+",
            TransactionKind::Withdrawal => "-",
        };
        format!("{}{} FCFA", sign, self.amount)
    }

    pub fn platform_name(&self) -> Option<&str> {
        self.app_details.as_ref().map(|d| d.name.as_str())
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Server pagination envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Fee retained on Moov connect deposits when settings carry none (1%)
pub const DEFAULT_FEE_BASIS_POINTS: u32 = 100;

/// Read-only server settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub referral_bonus: bool,
    /// provider (lowercase) -> country code -> merchant phone
    #[serde(default)]
    pub merchant_phones: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub fee_basis_points: Option<u32>,
}

impl Settings {
    pub fn merchant_phone(&self, provider: &str, country_code: &str) -> Option<&str> {
        self.merchant_phones
            .get(&provider.to_lowercase())
            .and_then(|by_country| by_country.get(country_code))
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
    }

    pub fn fee_basis_points(&self) -> u32 {
        self.fee_basis_points.unwrap_or(DEFAULT_FEE_BASIS_POINTS)
    }
}

// =============================================================================
// Account Types
// =============================================================================

/// Authenticated user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub referral_code: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Answer of `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub data: User,
}

/// Payload of `POST /auth/registration`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub re_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
}

/// Payload of `POST /auth/edit`
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Payload of `POST /auth/change_password`
#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

// =============================================================================
// Feed Types
// =============================================================================

/// Server notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Coupon published for a betting platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: u64,
    pub code: String,
    #[serde(default)]
    pub bet_app: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Dashboard advertisement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub enable: bool,
}
