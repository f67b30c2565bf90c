//! Side effects the wizard asks for: waiting, notifying and navigating.
//! Each one is a trait so tests can record instead of acting.

use super::outcome::{Route, TerminalAction};
use crate::error::IcashResult;
use crate::log_warn;
use std::time::Duration;

/// Waits between a committed selection and the next step
pub trait Scheduler {
    fn sleep(&mut self, delay: Duration);
}

/// Blocks the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn sleep(&mut self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Records requested delays without waiting
#[derive(Debug, Default, Clone)]
pub struct RecordingScheduler {
    pub delays: Vec<Duration>,
}

impl Scheduler for RecordingScheduler {
    fn sleep(&mut self, delay: Duration) {
        self.delays.push(delay);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Global notification sink (toasts)
pub trait Notifier {
    fn notify(&mut self, level: NoticeLevel, message: &str);
}

/// Keeps notices in memory
#[derive(Debug, Default, Clone)]
pub struct NoticeLog {
    pub notices: Vec<(NoticeLevel, String)>,
}

impl NoticeLog {
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.notices
            .iter()
            .filter(|(level, _)| *level == NoticeLevel::Error)
            .map(|(_, m)| m.as_str())
    }
}

impl Notifier for NoticeLog {
    fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.notices.push((level, message.to_string()));
    }
}

/// Navigation layer
pub trait Navigator {
    /// Follow a `tel:` URI; the outcome never blocks the next route
    fn dial(&mut self, tel_uri: &str) -> IcashResult<()>;
    fn open_external(&mut self, url: &str) -> IcashResult<()>;
    fn go(&mut self, route: &Route);
}

/// Carry out a terminal action. Prompts are left to the caller.
pub fn execute<S: Scheduler, N: Navigator>(action: &TerminalAction, scheduler: &mut S, navigator: &mut N) {
    match action {
        TerminalAction::Dial {
            tel_uri,
            dial_after,
            then,
            route_after,
        } => {
            scheduler.sleep(*dial_after);
            if let Err(e) = navigator.dial(tel_uri) {
                log_warn!("wizard", "Dial failed", error = e.message);
            }
            scheduler.sleep(route_after.saturating_sub(*dial_after));
            navigator.go(then);
        }
        TerminalAction::OpenLink { url, then } => {
            if let Err(e) = navigator.open_external(url) {
                log_warn!("wizard", "Could not open payment link", error = e.message);
            }
            navigator.go(then);
        }
        TerminalAction::Navigate(route) => navigator.go(route),
        TerminalAction::Prompt(_) => {}
    }
}
