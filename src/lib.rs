//! iCASH Client Library
//!
//! Blocking client for the iCASH mobile-money deposit/withdrawal service.
//!
//! # Architecture
//!
//! This crate provides:
//! - **api**: Typed REST surfaces and their reqwest implementation
//! - **auth**: Login, signup, password reset, profile and the `Session`
//! - **wizard**: The five-step deposit/withdrawal flow and its branching
//! - **ussd**: USSD codes computed from settings for connect-mode networks
//! - **bet_id**: Bet-ID search, confirmation and linking
//! - **phone**: Phone number cleaning and the user's phone book
//! - **history**: Transaction history queries
//! - **notifications**: Notification feed, push inbox, coupons, advertisement
//!
//! # Example
//!
//! ```rust,ignore
//! use icash_client::{ClientConfig, HttpApiClient, Session, TransactionKind};
//! use icash_client::wizard::{Selection, ThreadScheduler, Wizard, WizardOptions};
//!
//! let config = ClientConfig::load(None)?;
//! let mut api = HttpApiClient::new(&config)?;
//! api.attach_session(&session);
//!
//! let mut wizard = Wizard::new(
//!     TransactionKind::Deposit,
//!     WizardOptions::from_config(&config),
//!     ThreadScheduler,
//! );
//! wizard.commit(Selection::Platform(platform))?;
//! ```

pub mod api;
pub mod auth;
pub mod bet_id;
pub mod config;
pub mod error;
pub mod history;
pub mod notifications;
pub mod phone;
pub mod types;
pub mod ussd;
pub mod utils;
pub mod wizard;

pub use api::HttpApiClient;
pub use auth::{Session, SessionStore};
pub use config::ClientConfig;
pub use error::{ErrorCode, IcashError, IcashResult};
pub use types::*;
