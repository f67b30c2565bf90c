//! Step Validators
//!
//! Pure checks over `WizardState`. `check_step` returns the first failing
//! reason for inline messages; `can_advance` is the boolean form used to
//! enable the "next" action.

use super::state::{Step, WizardState};
use crate::error::IcashError;
use crate::types::{Amount, Platform, TransactionKind};
use thiserror::Error;

pub const MIN_WITHDRAWAL_CODE_LENGTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("Veuillez choisir une plateforme")]
    MissingPlatform,
    #[error("Veuillez choisir un ID de pari")]
    MissingBetId,
    #[error("Veuillez choisir un réseau")]
    MissingNetwork,
    #[error("Veuillez choisir un numéro de téléphone")]
    MissingPhone,
    #[error("Veuillez entrer un montant")]
    MissingAmount,
    #[error("Le montant doit être supérieur à 0")]
    ZeroAmount,
    #[error("Le montant minimum est {0} FCFA")]
    BelowMinimum(Amount),
    #[error("Le montant maximum est {0} FCFA")]
    AboveMaximum(Amount),
    #[error("Le code de retrait doit contenir au moins 4 caractères")]
    WithdrawalCodeTooShort,
}

impl From<StepError> for IcashError {
    fn from(err: StepError) -> Self {
        IcashError::validation(err.to_string())
    }
}

/// Amount against the platform's inclusive bounds for the direction
pub fn check_amount(amount: Amount, platform: &Platform, kind: TransactionKind) -> Result<(), StepError> {
    if amount == 0 {
        return Err(StepError::ZeroAmount);
    }
    let (min, max) = platform.bounds(kind);
    if amount < min {
        return Err(StepError::BelowMinimum(min));
    }
    if amount > max {
        return Err(StepError::AboveMaximum(max));
    }
    Ok(())
}

pub fn check_withdrawal_code(code: Option<&str>) -> Result<(), StepError> {
    match code.map(str::trim) {
        Some(code) if code.chars().count() >= MIN_WITHDRAWAL_CODE_LENGTH => Ok(()),
        _ => Err(StepError::WithdrawalCodeTooShort),
    }
}

/// First reason the step cannot be left
pub fn check_step(state: &WizardState, step: Step) -> Result<(), StepError> {
    match step {
        Step::Platform => state.platform.as_ref().map(|_| ()).ok_or(StepError::MissingPlatform),
        Step::BetId => state.bet_id.as_ref().map(|_| ()).ok_or(StepError::MissingBetId),
        Step::Network => state.network.as_ref().map(|_| ()).ok_or(StepError::MissingNetwork),
        Step::Phone => state.phone.as_ref().map(|_| ()).ok_or(StepError::MissingPhone),
        Step::Amount => {
            let platform = state.platform.as_ref().ok_or(StepError::MissingPlatform)?;
            let amount = state.amount.ok_or(StepError::MissingAmount)?;
            check_amount(amount, platform, state.kind)?;
            if state.kind == TransactionKind::Withdrawal {
                check_withdrawal_code(state.withdrawal_code.as_deref())?;
            }
            Ok(())
        }
    }
}

pub fn can_advance(state: &WizardState, step: Step) -> bool {
    check_step(state, step).is_ok()
}

/// First step (in order) whose check fails, with its reason
pub fn first_failure(state: &WizardState) -> Option<(Step, StepError)> {
    Step::ALL
        .iter()
        .find_map(|step| check_step(state, *step).err().map(|e| (*step, e)))
}
