//! Name normalization for dependency and technology matching.

use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)\s*$").unwrap());

static TRAILING_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+v?\d+(?:\.\d+){0,3}\s*$").unwrap());

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

fn is_name_terminator(c: char) -> bool {
    matches!(
        c,
        '<' | '>' | '=' | '!' | '~' | '@' | ':' | '[' | ']' | '(' | ')'
    ) || c.is_whitespace()
}

/// Comparison key for a dependency or technology name.
///
/// Strips quotes and backticks, keeps the last `/` segment, cuts at the first
/// version, extras, or marker delimiter and lower-cases the rest.
///
/// ```
/// use repolens_evidence::normalize_name;
///
/// assert_eq!(normalize_name("Flask>=3.0"), "flask");
/// assert_eq!(normalize_name("github.com/gin-gonic/gin v1.9.1"), "gin");
/// assert_eq!(normalize_name("`uvicorn[standard]`"), "uvicorn");
/// ```
#[must_use]
pub fn normalize_name(value: &str) -> String {
    let trimmed = value.trim().trim_matches(['"', '\'', '`']);
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let end = last.find(is_name_terminator).unwrap_or(last.len());
    last[..end].to_lowercase()
}

/// Package name of a requirement specifier, display case preserved.
///
/// `"requests[socks]>=2.0 ; python_version>'3'"` becomes `"requests"`.
#[must_use]
pub fn requirement_name(spec: &str) -> String {
    let spec = spec.trim().trim_matches(['"', '\'']);
    let end = spec
        .find(|c: char| {
            matches!(c, '<' | '>' | '=' | '!' | '~' | ';' | '[' | '@') || c.is_whitespace()
        })
        .unwrap_or(spec.len());
    spec[..end].trim().to_string()
}

/// Clean a technology name proposed by the model.
///
/// Removes backticks, a trailing parenthetical and a trailing version, then
/// collapses repeated spaces.
///
/// ```
/// use repolens_evidence::clean_technology;
///
/// assert_eq!(clean_technology("`FastAPI` (web framework)"), "FastAPI");
/// assert_eq!(clean_technology("Python 3.11"), "Python");
/// assert_eq!(clean_technology("Node.js v20"), "Node.js");
/// ```
#[must_use]
pub fn clean_technology(value: &str) -> String {
    let cleaned = value.trim().trim_matches('`');
    let cleaned = TRAILING_PARENTHETICAL.replace(cleaned, "");
    let cleaned = TRAILING_VERSION.replace(&cleaned, "");
    let cleaned = MULTI_SPACE.replace_all(&cleaned, " ");
    cleaned
        .trim_matches([' ', '-', '_', ',', ';', '`'])
        .to_string()
}
