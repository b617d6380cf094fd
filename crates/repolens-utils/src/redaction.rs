//! Redaction of credentials from messages before they are logged or returned.

use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern to match URLs with embedded credentials
static URL_WITH_CREDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(https?://)[^:@\s/]+:[^@\s/]+@").unwrap());

/// Pattern to match bearer/token authorization values
static AUTH_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(bearer|token)\s+[A-Za-z0-9._~+/=-]{8,}").unwrap());

/// Pattern to match potential API keys (runs of 32+ key-like characters)
static POTENTIAL_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^A-Za-z0-9_-])[A-Za-z0-9_-]{32,}([^A-Za-z0-9_-]|$)").unwrap()
});

/// Redact sensitive information from an error message.
///
/// Redaction rules:
/// - URLs with embedded credentials keep scheme and host only
/// - `Bearer`/`token` authorization values are replaced
/// - Long key-like tokens are replaced with `[REDACTED_KEY]`
#[must_use]
pub fn redact_error_message(message: &str) -> String {
    let redacted = URL_WITH_CREDS.replace_all(message, "$1[REDACTED]@");
    let redacted = AUTH_HEADER.replace_all(&redacted, "$1 [REDACTED]");
    let redacted = POTENTIAL_KEY.replace_all(&redacted, "${1}[REDACTED_KEY]${2}");
    redacted.into_owned()
}
