//! Logging utilities.
//!
//! - [`escape_log`] keeps multi-line API payloads on a single log line.
//! - [`ScopedLogger`] is the explicit logging handle threaded through the
//!   engine; it prefixes every record with its scope (usually a character
//!   name) so interleaved output from concurrent characters stays readable.

use log::Level;
use std::fmt;

/// Log target used for all engine records
pub const ENGINE_TARGET: &str = "mmoengine::engine";

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
///   Truncates very long strings (over `max_preview`) with an ellipsis to cap log noise.
pub fn escape_log(s: &str) -> String {
    const MAX_PREVIEW: usize = 300; // generous for debug; adjust if needed
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                // Represent other control chars as hex \xNN
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Logging handle carrying a scope prefix.
///
/// Cheap to clone; engine functions receive one through their context
/// instead of reaching for a global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedLogger {
    scope: String,
}

impl ScopedLogger {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }

    /// Nested scope, e.g. `alice/orders`
    pub fn child(&self, name: &str) -> Self {
        Self {
            scope: format!("{}/{}", self.scope, name),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(target: ENGINE_TARGET, level, "[{}] {}", self.scope, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }
}
