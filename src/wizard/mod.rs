//! Deposit/Withdrawal Wizard
//!
//! A five-step form session that accumulates selections into one
//! `TransactionRequest`, submits it and decides where the user goes next:
//! - `state`: steps, selections and request flattening
//! - `validators`: per-step "can advance" checks with reasons
//! - `machine`: the `Wizard` transitions
//! - `outcome`: terminal branching after a successful submission
//! - `effects`: scheduler, notifier and navigator seams
//! - `catalog`: platforms, networks, bet IDs and phones to choose from

pub mod catalog;
mod effects;
mod machine;
mod outcome;
mod state;
pub mod validators;

#[cfg(test)]
mod tests;

pub use effects::*;
pub use machine::*;
pub use outcome::*;
pub use state::*;
pub use validators::{can_advance, check_step, StepError};
