//! Terminal Branching
//!
//! What happens after a transaction was created. First match wins:
//! 1. the answer carries a USSD code: dial it, then show the detail
//! 2. the answer carries a payment link: open it, then show the detail
//! 3. the network is a connect-mode provider: offer a computed USSD code
//! 4. otherwise: back to the dashboard
//!
//! Step 3 only exists under `TerminalPolicy::ProviderPrompt`; with
//! `TerminalPolicy::LinkOrDetail` step 4 routes to the detail instead.

use crate::types::{Amount, Network, Settings, TransactionResponse};
use crate::ussd::{compute_ussd, tel_uri, Provider, ProviderUssd};
use std::fmt;
use std::time::Duration;

/// Navigation target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    TransactionDetail { id: u64 },
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Dashboard => "/dashboardv3".to_string(),
            Route::TransactionDetail { id } => format!("/dashboardv3/history/detail?id={}", id),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Which terminal-branch variant the wizard runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminalPolicy {
    /// Dial / link / provider prompt / dashboard
    #[default]
    ProviderPrompt,
    /// Dial / link / detail, never prompts
    LinkOrDetail,
}

/// Answer to a provider prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Dial,
    Close,
}

/// Provider-branded offer to dial a client-computed USSD code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPrompt {
    pub transaction_id: u64,
    pub ussd: ProviderUssd,
    pub amount: Amount,
}

impl ProviderPrompt {
    pub fn provider(&self) -> Provider {
        self.ussd.provider
    }

    pub fn message(&self) -> String {
        format!(
            "Composez {} pour finaliser votre dépôt de {} FCFA avec {}",
            self.ussd.code,
            self.amount,
            self.ussd.provider.brand()
        )
    }

    /// Dialing continues to the transaction detail; closing returns home
    pub fn resolve(&self, choice: PromptChoice, timing: &TerminalTiming) -> TerminalAction {
        match choice {
            PromptChoice::Dial => TerminalAction::Dial {
                tel_uri: self.ussd.tel_uri(),
                dial_after: timing.dial_delay,
                then: Route::TransactionDetail {
                    id: self.transaction_id,
                },
                route_after: timing.detail_delay,
            },
            PromptChoice::Close => TerminalAction::Navigate(Route::Dashboard),
        }
    }
}

/// Delays used when dialing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalTiming {
    pub dial_delay: Duration,
    pub detail_delay: Duration,
}

impl Default for TerminalTiming {
    fn default() -> Self {
        Self {
            dial_delay: Duration::from_millis(300),
            detail_delay: Duration::from_millis(800),
        }
    }
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalAction {
    /// Follow `tel_uri` after `dial_after`, then go to `then` at
    /// `route_after` (both measured from submission)
    Dial {
        tel_uri: String,
        dial_after: Duration,
        then: Route,
        route_after: Duration,
    },
    /// Open `url` in a new context, then go to `then`
    OpenLink { url: String, then: Route },
    Prompt(ProviderPrompt),
    Navigate(Route),
}

impl TerminalAction {
    /// Final route, if already known
    pub fn route(&self) -> Option<&Route> {
        match self {
            TerminalAction::Dial { then, .. } | TerminalAction::OpenLink { then, .. } => Some(then),
            TerminalAction::Navigate(route) => Some(route),
            TerminalAction::Prompt(_) => None,
        }
    }
}

/// Pick the terminal action for a creation answer
pub fn resolve_terminal(
    policy: TerminalPolicy,
    response: &TransactionResponse,
    network: &Network,
    amount: Amount,
    settings: Option<&Settings>,
    timing: &TerminalTiming,
) -> TerminalAction {
    let detail = Route::TransactionDetail { id: response.id };

    if let Some(code) = response.ussd() {
        return TerminalAction::Dial {
            tel_uri: tel_uri(code),
            dial_after: timing.dial_delay,
            then: detail,
            route_after: timing.detail_delay,
        };
    }
    if let Some(url) = response.link() {
        return TerminalAction::OpenLink {
            url: url.to_string(),
            then: detail,
        };
    }

    match policy {
        TerminalPolicy::LinkOrDetail => TerminalAction::Navigate(detail),
        TerminalPolicy::ProviderPrompt => settings
            .and_then(|s| compute_ussd(network, amount, s))
            .map(|ussd| {
                TerminalAction::Prompt(ProviderPrompt {
                    transaction_id: response.id,
                    ussd,
                    amount,
                })
            })
            .unwrap_or(TerminalAction::Navigate(Route::Dashboard)),
    }
}
