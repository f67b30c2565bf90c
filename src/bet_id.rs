//! Bet-ID Lookup
//!
//! A bet ID is checked against the platform before it is linked to the
//! account. The platform answers with `{UserId, CurrencyId, Name}`:
//! - `UserId == 0` means the account does not exist, whatever the currency
//! - a `CurrencyId` other than XOF means the account cannot be used
//! - anything else is a match that the user must confirm by name

use crate::api::UserAppIdApi;
use crate::error::{IcashError, IcashResult};
use crate::types::{BetIdSearch, UserAppId, XOF_CURRENCY_ID};
use crate::utils::sanitize::sanitize_bet_id;
use crate::{log_info, log_warn};
use thiserror::Error;

/// Outcome of a platform user search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BetIdLookup {
    NotFound,
    WrongCurrency { currency_id: i64 },
    Found { name: String },
}

/// Classify a raw search answer
pub fn classify(search: &BetIdSearch) -> BetIdLookup {
    if search.user_id == 0 {
        BetIdLookup::NotFound
    } else if search.currency_id != XOF_CURRENCY_ID {
        BetIdLookup::WrongCurrency {
            currency_id: search.currency_id,
        }
    } else {
        BetIdLookup::Found {
            name: search.name.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Utilisateur non trouvé sur la plateforme")]
    NotFound,
    #[error("Le compte doit être en XOF (devise {0})")]
    WrongCurrency(i64),
    #[error("Aucune recherche à confirmer")]
    NothingToConfirm,
}

impl From<LookupError> for IcashError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound => IcashError::not_found(err.to_string()),
            LookupError::WrongCurrency(_) => IcashError::currency_mismatch(err.to_string()),
            LookupError::NothingToConfirm => IcashError::invalid_state(err.to_string()),
        }
    }
}

/// A found account waiting for the user's confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBetId {
    pub platform_id: String,
    pub bet_id: String,
    pub name: String,
}

/// Search, confirm and link bet IDs for the current user
pub struct BetIdLinker<'a, A: UserAppIdApi> {
    api: &'a A,
    pending: Option<PendingBetId>,
}

impl<'a, A: UserAppIdApi> BetIdLinker<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api, pending: None }
    }

    /// Bet IDs already linked to a platform
    pub fn linked(&self, platform_id: &str) -> IcashResult<Vec<UserAppId>> {
        self.api.user_app_ids_for(platform_id)
    }

    /// Look the bet ID up on the platform.
    ///
    /// Blank IDs are rejected without a call. A match is held as pending
    /// until `confirm` or `cancel`; it is never linked automatically.
    pub fn search(&mut self, platform_id: &str, bet_id: &str) -> IcashResult<&PendingBetId> {
        self.pending = None;
        let bet_id = sanitize_bet_id(bet_id)?;
        let answer = self.api.search_user(platform_id, &bet_id)?;

        match classify(&answer) {
            BetIdLookup::NotFound => {
                log_warn!("bet_id", "Bet ID not found", platform = platform_id);
                Err(LookupError::NotFound.into())
            }
            BetIdLookup::WrongCurrency { currency_id } => {
                log_warn!("bet_id", "Bet ID has wrong currency", platform = platform_id, currency = currency_id);
                Err(LookupError::WrongCurrency(currency_id).into())
            }
            BetIdLookup::Found { name } => Ok(self.pending.insert(PendingBetId {
                platform_id: platform_id.to_string(),
                bet_id,
                name,
            })),
        }
    }

    pub fn pending(&self) -> Option<&PendingBetId> {
        self.pending.as_ref()
    }

    /// Link the pending bet ID to the account
    pub fn confirm(&mut self) -> IcashResult<UserAppId> {
        let pending = self.pending.take().ok_or(LookupError::NothingToConfirm)?;
        match self.api.create_user_app_id(&pending.bet_id, &pending.platform_id) {
            Ok(created) => {
                log_info!("bet_id", "Bet ID linked", id = created.id, platform = pending.platform_id);
                Ok(created)
            }
            Err(e) => {
                self.pending = Some(pending);
                Err(e)
            }
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn update(&self, id: u64, bet_id: &str, platform_id: &str) -> IcashResult<UserAppId> {
        let bet_id = sanitize_bet_id(bet_id)?;
        self.api.update_user_app_id(id, &bet_id, platform_id)
    }

    pub fn remove(&self, id: u64) -> IcashResult<()> {
        self.api.delete_user_app_id(id)
    }
}
