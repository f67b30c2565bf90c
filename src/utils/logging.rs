//! Structured Logging with Sensitive Data Redaction
//!
//! One line per event on stderr: UTC timestamp, level, module, message and
//! `key=value` fields. Values are masked according to their key:
//! - credentials (passwords, OTPs, tokens, withdrawal codes) never appear
//! - phone numbers keep their country code and last two digits

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Turn on `log_debug!` output for the rest of the process
pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

/// Truthy values accepted for `ICASH_DEBUG`
pub fn debug_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        })
    }
}

/// How a field value is shown, decided from its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    Plain,
    Phone,
    Secret,
}

const SECRET_KEYS: &[&str] = &[
    "password",
    "token",
    "access",
    "refresh",
    "otp",
    "secret",
    "withdriwal_code",
    "withdrawal_code",
    "authorization",
];

const PHONE_KEYS: &[&str] = &["phone", "merchant", "msisdn"];

impl Sensitivity {
    pub fn of(key: &str) -> Self {
        let key = key.to_lowercase();
        if SECRET_KEYS.iter().any(|k| key.contains(k)) {
            Sensitivity::Secret
        } else if PHONE_KEYS.iter().any(|k| key.contains(k)) {
            Sensitivity::Phone
        } else {
            Sensitivity::Plain
        }
    }

    pub fn mask(self, value: &str) -> String {
        match self {
            Sensitivity::Plain => value.to_string(),
            Sensitivity::Phone => mask_phone(value),
            Sensitivity::Secret => mask_secret(value),
        }
    }
}

fn mask_secret(value: &str) -> String {
    match value.chars().count() {
        0 => "[EMPTY]".to_string(),
        1..=4 => "[REDACTED]".to_string(),
        n => format!("[REDACTED:{}chars]", n),
    }
}

fn mask_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        0 => "[EMPTY]".to_string(),
        1..=6 => mask_secret(&digits),
        n => format!("{}{}{}", &digits[..3], "*".repeat(n - 5), &digits[n - 2..]),
    }
}

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Attach a field, masked according to its key
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let shown = Sensitivity::of(key).mask(&value.to_string());
        self.fields.push((key, shown));
        self
    }

    /// Attach a phone number whatever the key is called
    pub fn phone_field(mut self, key: &'static str, phone: &str) -> Self {
        self.fields.push((key, mask_phone(phone)));
        self
    }

    /// Line without the timestamp
    pub fn render(&self) -> String {
        let mut line = format!("{} [{}] {}", self.level, self.module, self.message);
        for (i, (key, value)) in self.fields.iter().enumerate() {
            line.push_str(if i == 0 { " | " } else { " " });
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        line
    }

    pub fn log(self) {
        if self.level == LogLevel::Debug && !is_debug_enabled() {
            return;
        }
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        eprintln!("[{}] {}", timestamp, self.render());
    }
}

/// Shared body of the `log_*!` macros
#[doc(hidden)]
#[macro_export]
macro_rules! __icash_log {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::$level,
            $module,
            $msg,
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__icash_log!(Debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__icash_log!(Info, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__icash_log!(Warn, $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__icash_log!(Error, $($arg)*) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitivity_by_key() {
        assert_eq!(Sensitivity::of("password"), Sensitivity::Secret);
        assert_eq!(Sensitivity::of("access_token"), Sensitivity::Secret);
        assert_eq!(Sensitivity::of("withdriwal_code"), Sensitivity::Secret);
        assert_eq!(Sensitivity::of("phone_number"), Sensitivity::Phone);
        assert_eq!(Sensitivity::of("amount"), Sensitivity::Plain);
    }

    #[test]
    fn test_masks() {
        assert_eq!(mask_secret(""), "[EMPTY]");
        assert_eq!(mask_secret("abc"), "[REDACTED]");
        assert_eq!(mask_secret("eyJhbGciOiJIUzI1"), "[REDACTED:16chars]");
        assert_eq!(mask_phone("22997123456"), "229******56");
        assert_eq!(mask_phone("+229 97 12 34 56"), "229******56");
        assert_eq!(mask_phone("1234"), "[REDACTED]");
    }

    #[test]
    fn test_render() {
        let entry = LogEntry::new(LogLevel::Info, "wizard", "Deposit submitted")
            .field("amount", 10000)
            .field("password", "hunter22")
            .phone_field("to", "22960000000");

        assert_eq!(
            entry.render(),
            "INFO [wizard] Deposit submitted | amount=10000 password=[REDACTED:8chars] to=229******00"
        );
        assert_eq!(LogEntry::new(LogLevel::Warn, "auth", "Expired").render(), "WARN [auth] Expired");
    }

    #[test]
    fn test_debug_flag() {
        assert!(debug_flag("1"));
        assert!(debug_flag(" TRUE "));
        assert!(!debug_flag("0"));
        assert!(!debug_flag(""));
    }
}
