//! Wizard state machine
//!
//! ```text
//! Platform(1) -> BetId(2) -> Network(3) -> Phone(4) -> Amount(5)
//!     -> Confirming -> Submitting -> Completed
//! ```
//!
//! Committing a selection on steps 1-4 waits `auto_advance` on the
//! scheduler and moves on. Step 5 only moves to `Confirming` once the
//! amount (and withdrawal code) pass validation. A failed submission
//! goes back to `Confirming` with every selection kept.

use super::effects::{NoticeLevel, Notifier, Scheduler};
use super::outcome::{resolve_terminal, TerminalAction, TerminalPolicy, TerminalTiming};
use super::state::{Selection, Step, WizardState};
use super::validators::{check_step, StepError};
use crate::api::{SettingsApi, TransactionApi};
use crate::config::ClientConfig;
use crate::error::{IcashError, IcashResult};
use crate::types::{Amount, TransactionKind};
use crate::{log_debug, log_info, log_warn};
use std::fmt;
use std::time::Duration;

/// Where the session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Editing(Step),
    Confirming,
    Submitting,
    Completed,
}

/// Wizard timings and wire settings
#[derive(Debug, Clone)]
pub struct WizardOptions {
    pub auto_advance: Duration,
    pub terminal: TerminalTiming,
    pub source: String,
    pub policy: TerminalPolicy,
}

impl Default for WizardOptions {
    fn default() -> Self {
        Self {
            auto_advance: Duration::from_secs(1),
            terminal: TerminalTiming::default(),
            source: "web".to_string(),
            policy: TerminalPolicy::default(),
        }
    }
}

impl WizardOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            auto_advance: config.auto_advance_delay(),
            terminal: TerminalTiming {
                dial_delay: config.dial_delay(),
                detail_delay: config.detail_delay(),
            },
            source: config.source.clone(),
            policy: TerminalPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TerminalPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Summary shown before confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub kind: TransactionKind,
    pub platform: String,
    pub bet_id: String,
    pub network: String,
    pub phone: String,
    pub amount: Amount,
    pub network_message: Option<String>,
    pub has_withdrawal_code: bool,
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind.label())?;
        writeln!(f, "  Plateforme : {}", self.platform)?;
        writeln!(f, "  ID de pari : {}", self.bet_id)?;
        writeln!(f, "  Réseau     : {}", self.network)?;
        writeln!(f, "  Téléphone  : {}", self.phone)?;
        write!(f, "  Montant    : {} FCFA", self.amount)?;
        if self.has_withdrawal_code {
            write!(f, "\n  Code de retrait : ****")?;
        }
        if let Some(ref message) = self.network_message {
            write!(f, "\n  {}", message)?;
        }
        Ok(())
    }
}

/// Deposit or withdrawal wizard
pub struct Wizard<S: Scheduler> {
    state: WizardState,
    phase: Phase,
    options: WizardOptions,
    scheduler: S,
}

impl<S: Scheduler> Wizard<S> {
    pub fn new(kind: TransactionKind, options: WizardOptions, scheduler: S) -> Self {
        Self {
            state: WizardState::new(kind),
            phase: Phase::Editing(Step::Platform),
            options,
            scheduler,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn kind(&self) -> TransactionKind {
        self.state.kind
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn options(&self) -> &WizardOptions {
        &self.options
    }

    fn editing_step(&self) -> IcashResult<Step> {
        match self.phase {
            Phase::Editing(step) => Ok(step),
            other => Err(IcashError::invalid_state(format!(
                "Action impossible pendant {:?}",
                other
            ))),
        }
    }

    fn go_to(&mut self, step: Step) {
        self.state.step = step;
        self.phase = Phase::Editing(step);
    }

    /// Commit the selection of the current step and auto-advance
    pub fn commit(&mut self, selection: Selection) -> IcashResult<Step> {
        let step = self.editing_step()?;
        if selection.step() != step {
            return Err(IcashError::invalid_state(format!(
                "Sélection pour l'étape {} reçue à l'étape {}",
                selection.step().number(),
                step.number()
            )));
        }

        self.state.apply(selection);
        log_debug!("wizard", "Selection committed", step = step.number());

        self.scheduler.sleep(self.options.auto_advance);
        self.advance()
    }

    pub fn set_amount(&mut self, amount: Amount) -> IcashResult<()> {
        self.editing_step()?;
        self.state.amount = Some(amount);
        Ok(())
    }

    pub fn set_withdrawal_code(&mut self, code: &str) -> IcashResult<()> {
        self.editing_step()?;
        if self.state.kind != TransactionKind::Withdrawal {
            return Err(IcashError::invalid_input(
                "Le code de retrait ne concerne que les retraits",
            ));
        }
        self.state.withdrawal_code = Some(code.trim().to_string());
        Ok(())
    }

    /// Current step's first failing reason, if any
    pub fn current_error(&self) -> Option<StepError> {
        match self.phase {
            Phase::Editing(step) => check_step(&self.state, step).err(),
            _ => None,
        }
    }

    /// Leave the current step. From step 5 this opens the review.
    pub fn advance(&mut self) -> IcashResult<Step> {
        let step = self.editing_step()?;
        check_step(&self.state, step)?;

        match step.next() {
            Some(next) => {
                self.go_to(next);
                Ok(next)
            }
            None => {
                self.phase = Phase::Confirming;
                Ok(step)
            }
        }
    }

    /// Previous step, never below the first
    pub fn back(&mut self) -> IcashResult<Step> {
        let step = self.editing_step()?;
        let previous = step.previous().unwrap_or(Step::Platform);
        self.go_to(previous);
        Ok(previous)
    }

    /// Review of the pending request (only while confirming)
    pub fn review(&self) -> IcashResult<Review> {
        if self.phase != Phase::Confirming {
            return Err(IcashError::invalid_state("Aucune transaction à confirmer"));
        }
        let missing = || IcashError::invalid_state("Données manquantes pour la transaction");
        let platform = self.state.platform.as_ref().ok_or_else(missing)?;
        let bet_id = self.state.bet_id.as_ref().ok_or_else(missing)?;
        let network = self.state.network.as_ref().ok_or_else(missing)?;
        let phone = self.state.phone.as_ref().ok_or_else(missing)?;

        Ok(Review {
            kind: self.state.kind,
            platform: platform.name.clone(),
            bet_id: bet_id.user_app_id.clone(),
            network: network.display_name().to_string(),
            phone: phone.phone.clone(),
            amount: self.state.amount.ok_or_else(missing)?,
            network_message: network.message_for(self.state.kind).map(String::from),
            has_withdrawal_code: self.state.withdrawal_code.is_some(),
        })
    }

    /// Close the review and return to the amount step
    pub fn cancel_review(&mut self) -> IcashResult<()> {
        if self.phase != Phase::Confirming {
            return Err(IcashError::invalid_state("Aucune transaction à confirmer"));
        }
        self.go_to(Step::Amount);
        Ok(())
    }

    /// Create the transaction and pick the terminal action.
    ///
    /// On failure the error goes to `notifier`, the wizard returns to
    /// `Confirming` and the selections are untouched.
    pub fn submit<A, N>(&mut self, api: &A, notifier: &mut N) -> IcashResult<TerminalAction>
    where
        A: TransactionApi + SettingsApi,
        N: Notifier,
    {
        if self.phase != Phase::Confirming {
            return Err(IcashError::invalid_state("Aucune transaction à confirmer"));
        }
        if let Some((step, reason)) = super::validators::first_failure(&self.state) {
            log_warn!("wizard", "Submission blocked", step = step.number());
            return Err(reason.into());
        }
        let request = self.state.build_request(&self.options.source)?;

        self.phase = Phase::Submitting;
        log_info!(
            "wizard",
            "Submitting transaction",
            kind = self.state.kind,
            amount = request.amount,
            network = request.network,
            phone = request.phone_number,
        );

        let response = match api.create_transaction(self.state.kind, &request) {
            Ok(response) => response,
            Err(e) => {
                log_warn!("wizard", "Submission failed", error = e.message);
                notifier.notify(NoticeLevel::Error, &e.message);
                self.phase = Phase::Confirming;
                return Err(e);
            }
        };

        let success = match self.state.kind {
            TransactionKind::Deposit => "Dépôt initié avec succès!",
            TransactionKind::Withdrawal => "Retrait initié avec succès!",
        };
        notifier.notify(NoticeLevel::Success, success);

        // Provider codes pay the merchant: deposits only
        let needs_settings = self.state.kind == TransactionKind::Deposit
            && self.options.policy == TerminalPolicy::ProviderPrompt
            && response.ussd().is_none()
            && response.link().is_none();
        let settings = if needs_settings {
            match api.settings() {
                Ok(settings) => Some(settings),
                Err(e) => {
                    log_warn!("wizard", "Settings unavailable", error = e.message);
                    None
                }
            }
        } else {
            None
        };

        let network = self
            .state
            .network
            .as_ref()
            .ok_or_else(|| IcashError::internal("network missing after validation"))?;
        let action = resolve_terminal(
            self.options.policy,
            &response,
            network,
            request.amount,
            settings.as_ref(),
            &self.options.terminal,
        );
        log_info!("wizard", "Transaction created", id = response.id);

        self.state = WizardState::new(self.state.kind);
        self.phase = Phase::Completed;
        Ok(action)
    }

    /// Start over after completion
    pub fn reset(&mut self) {
        self.state = WizardState::new(self.state.kind);
        self.phase = Phase::Editing(Step::Platform);
    }
}
