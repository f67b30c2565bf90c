//! Wizard state: the five steps and the selections accumulated so far

use crate::error::{IcashError, IcashResult};
use crate::phone::normalize_phone;
use crate::types::{Amount, Network, Platform, TransactionKind, TransactionRequest, UserAppId, UserPhone};
use std::fmt;

/// Form step, numbered 1 to 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Platform = 1,
    BetId = 2,
    Network = 3,
    Phone = 4,
    Amount = 5,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Platform,
        Step::BetId,
        Step::Network,
        Step::Phone,
        Step::Amount,
    ];

    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Step::Platform => "Choisir une plateforme",
            Step::BetId => "Choisir un ID de pari",
            Step::Network => "Choisir un réseau",
            Step::Phone => "Choisir un numéro",
            Step::Amount => "Montant",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5 {}", self.number(), self.title())
    }
}

/// A value committed on one of the selection steps (1 to 4)
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Platform(Platform),
    BetId(UserAppId),
    Network(Network),
    Phone(UserPhone),
}

impl Selection {
    /// Step this selection belongs to
    pub fn step(&self) -> Step {
        match self {
            Selection::Platform(_) => Step::Platform,
            Selection::BetId(_) => Step::BetId,
            Selection::Network(_) => Step::Network,
            Selection::Phone(_) => Step::Phone,
        }
    }
}

/// Selections of one deposit or withdrawal session
#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub kind: TransactionKind,
    pub step: Step,
    pub platform: Option<Platform>,
    pub bet_id: Option<UserAppId>,
    pub network: Option<Network>,
    pub phone: Option<UserPhone>,
    pub amount: Option<Amount>,
    pub withdrawal_code: Option<String>,
}

impl WizardState {
    pub fn new(kind: TransactionKind) -> Self {
        Self {
            kind,
            step: Step::Platform,
            platform: None,
            bet_id: None,
            network: None,
            phone: None,
            amount: None,
            withdrawal_code: None,
        }
    }

    /// Store a selection.
    ///
    /// A different platform invalidates the bet ID and a different network
    /// invalidates the phone; re-selecting the same value keeps them.
    pub fn apply(&mut self, selection: Selection) {
        match selection {
            Selection::Platform(platform) => {
                if self.platform.as_ref().map(|p| &p.id) != Some(&platform.id) {
                    self.bet_id = None;
                }
                self.platform = Some(platform);
            }
            Selection::BetId(bet_id) => self.bet_id = Some(bet_id),
            Selection::Network(network) => {
                if self.network.as_ref().map(|n| n.id) != Some(network.id) {
                    self.phone = None;
                }
                self.network = Some(network);
            }
            Selection::Phone(phone) => self.phone = Some(phone),
        }
    }

    /// Flatten the selections into the creation payload
    pub fn build_request(&self, source: &str) -> IcashResult<TransactionRequest> {
        let missing = || IcashError::invalid_state("Données manquantes pour la transaction");
        let platform = self.platform.as_ref().ok_or_else(missing)?;
        let bet_id = self.bet_id.as_ref().ok_or_else(missing)?;
        let network = self.network.as_ref().ok_or_else(missing)?;
        let phone = self.phone.as_ref().ok_or_else(missing)?;
        let amount = self.amount.ok_or_else(missing)?;

        let withdriwal_code = match self.kind {
            TransactionKind::Withdrawal => Some(
                self.withdrawal_code
                    .as_deref()
                    .map(str::trim)
                    .ok_or_else(missing)?
                    .to_string(),
            ),
            TransactionKind::Deposit => None,
        };

        Ok(TransactionRequest {
            amount,
            phone_number: normalize_phone(&phone.phone),
            app: platform.id.clone(),
            user_app_id: bet_id.user_app_id.clone(),
            network: network.id,
            source: source.to_string(),
            withdriwal_code,
        })
    }
}
