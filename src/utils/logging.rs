//! Structured Logging with Sensitive Data Redaction
//!
//! Log lines go to stderr as `timestamp LEVEL [module] message | k=v ...`.
//! Field values are classified by their key before they are rendered:
//! - spend material (secrets, blinding factors, seeds, tokens) is masked
//! - curve points are shortened to head and tail
//! - quote IDs and invoices are shortened more aggressively
//!
//! Call sites use the `log_debug!`/`log_info!`/`log_warn!`/`log_error!`
//! macros exported at the crate root.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lowest level that is written; `Info` until changed
static MIN_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn set_min_level(level: LogLevel) {
    MIN_LEVEL.store(level as u8, Ordering::SeqCst);
}

pub fn min_level() -> LogLevel {
    LogLevel::from_u8(MIN_LEVEL.load(Ordering::SeqCst))
}

/// Shorthand for `set_min_level(LogLevel::Debug)`
pub fn enable_debug() {
    set_min_level(LogLevel::Debug);
}

// =============================================================================
// Field classification
// =============================================================================

/// How a field value is rendered, decided by its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    /// Whoever reads it can spend or re-derive ecash
    Secret,
    /// Public curve point in hex
    Point,
    /// Quote ID or Lightning invoice
    Reference,
    Plain,
}

const SECRET_KEYS: &[&str] = &[
    "secret",
    "seed",
    "mnemonic",
    "passphrase",
    "blinding_factor",
    "private",
    "token",
    "preimage",
    "witness",
];

const POINT_KEYS: &[&str] = &["b_", "c_", "point", "signature", "y"];

const REFERENCE_KEYS: &[&str] = &["quote", "invoice", "request", "bolt11"];

impl FieldKind {
    fn of(key: &str) -> Self {
        let key = key.to_ascii_lowercase();

        if SECRET_KEYS.iter().any(|k| key.contains(k)) {
            FieldKind::Secret
        } else if POINT_KEYS
            .iter()
            .any(|k| key == *k || key.ends_with(&format!("_{}", k)))
        {
            FieldKind::Point
        } else if REFERENCE_KEYS.iter().any(|k| key.contains(k)) {
            FieldKind::Reference
        } else {
            FieldKind::Plain
        }
    }

    fn render(self, value: &str) -> String {
        match self {
            FieldKind::Secret => mask(value),
            FieldKind::Point => shorten(value, 10, 6).unwrap_or_else(|| value.trim().to_string()),
            FieldKind::Reference => shorten(value, 6, 4).unwrap_or_else(|| mask(value)),
            FieldKind::Plain => value.to_string(),
        }
    }
}

/// Replace a value with its length only
fn mask(value: &str) -> String {
    match value.len() {
        0 => "[EMPTY]".to_string(),
        1..=4 => "[REDACTED]".to_string(),
        n => format!("[REDACTED:{}chars]", n),
    }
}

/// `head...tail`, or `None` when the value is too short (or not ASCII) to cut
fn shorten(value: &str, head: usize, tail: usize) -> Option<String> {
    let trimmed = value.trim();
    if !trimmed.is_ascii() || trimmed.len() <= head + tail + 3 {
        return None;
    }
    Some(format!("{}...{}", &trimmed[..head], &trimmed[trimmed.len() - tail..]))
}

// =============================================================================
// Entries
// =============================================================================

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

    /// Attach a field, rendered according to its key
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let rendered = FieldKind::of(key).render(&value.to_string());
        self.fields.push((key, rendered));
        self
    }

    fn render(&self) -> String {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        let mut line = format!("[{}] {} [{}] {}", timestamp, self.level, self.module, self.message);

        if !self.fields.is_empty() {
            let fields: Vec<String> = self.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            line.push_str(" | ");
            line.push_str(&fields.join(" "));
        }
        line
    }

    pub fn log(self) {
        if self.level >= min_level() {
            eprintln!("{}", self.render());
        }
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::utils::logging::LogEntry::new($crate::utils::logging::LogLevel::$level, $module, $msg)
            $(.field(stringify!($key), &$value))*
            .log()
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($args:tt)*) => { $crate::__log_at!(Debug, $($args)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($args:tt)*) => { $crate::__log_at!(Info, $($args)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($args:tt)*) => { $crate::__log_at!(Warn, $($args)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($args:tt)*) => { $crate::__log_at!(Error, $($args)*) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask(""), "[EMPTY]");
        assert_eq!(mask("abc"), "[REDACTED]");
        assert_eq!(mask("407915bc212be61a"), "[REDACTED:16chars]");
    }

    #[test]
    fn test_classification() {
        assert_eq!(FieldKind::of("secret"), FieldKind::Secret);
        assert_eq!(FieldKind::of("blinding_factor"), FieldKind::Secret);
        assert_eq!(FieldKind::of("Token"), FieldKind::Secret);
        assert_eq!(FieldKind::of("B_"), FieldKind::Point);
        assert_eq!(FieldKind::of("proof_y"), FieldKind::Point);
        assert_eq!(FieldKind::of("quote_id"), FieldKind::Reference);
        assert_eq!(FieldKind::of("amount"), FieldKind::Plain);
        // "keyset" contains a "y" but is neither the key nor a suffix
        assert_eq!(FieldKind::of("keyset_id"), FieldKind::Plain);
    }

    #[test]
    fn test_points_and_references_are_shortened() {
        let point = "02fb82e61c96212d220a96998cf2e2bd0d74de5035b734d6cadbe7ed761eabbd3e";
        assert_eq!(FieldKind::Point.render(point), "02fb82e61c...abbd3e");
        assert_eq!(FieldKind::Point.render("02ab"), "02ab");

        let invoice = "lnbc100n1pjkdsxepp5uxh7fhm6s9tq3kzt0hhuw3ggu6lpyjg4q";
        assert_eq!(FieldKind::Reference.render(invoice), "lnbc10...jg4q");
        assert!(FieldKind::Reference.render("short").contains("REDACTED"));
    }

    #[test]
    fn test_entry_fields() {
        let entry = LogEntry::new(LogLevel::Info, "test", "Issued")
            .field("amount", 100)
            .field("seed", "000102030405")
            .field("quote", "DSGLX9kevM0gtuZU9hSr0x8NTTHmDSGL");

        assert_eq!(entry.fields[0], ("amount", "100".to_string()));
        assert!(entry.fields[1].1.contains("REDACTED"));
        assert_eq!(entry.fields[2].1, "DSGLX9...DSGL");

        let line = entry.render();
        assert!(line.contains("INFO [test] Issued | amount=100"));
        assert!(!line.contains("000102030405"));
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert_eq!(LogLevel::from_u8(LogLevel::Warn as u8), LogLevel::Warn);
        assert_eq!(LogLevel::from_u8(200), LogLevel::Error);
    }

    #[test]
    fn test_min_level_switch() {
        enable_debug();
        assert_eq!(min_level(), LogLevel::Debug);
        set_min_level(LogLevel::Info);
        assert_eq!(min_level(), LogLevel::Info);
    }
}
