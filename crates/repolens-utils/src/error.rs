use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use crate::redaction::redact_error_message;
use crate::types::{ErrorKind, FailureEnvelope};

/// Library-level error type for a summarization run.
///
/// Every variant maps to exactly one stable [`ErrorKind`] and carries enough
/// detail to diagnose the failure without leaking credentials. Callers turn it
/// into a [`FailureEnvelope`] with [`to_envelope()`](Self::to_envelope) and into
/// a process exit code with [`to_exit_code()`](Self::to_exit_code).
///
/// # Kind Mapping
///
/// | Variant | Kind |
/// |---------|------|
/// | `Config` | `invalid_input` |
/// | `Retrieval(InvalidUrl)` | `invalid_input` |
/// | `Retrieval(NotFound)` | `upstream_not_found` |
/// | `Retrieval(RateLimited)`, `Llm(ProviderQuota)` | `upstream_rate_limited` |
/// | `Retrieval(Timeout)`, `Llm(Timeout)` | `upstream_timeout` |
/// | `Llm(MalformedOutput)`, `Llm(SchemaMismatch)`, `InvalidOutput` | `malformed_model_output` |
/// | `ContentTooLarge` | `content_too_large` |
/// | `NoEligibleFiles`, `NoRetrievableContent`, other upstream failures | `upstream_error` |
/// | `Internal`, `Llm(Misconfiguration)` | `internal` |
#[derive(Error, Debug)]
pub enum RepolensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Generation error: {0}")]
    Llm(#[from] LlmError),

    #[error("No eligible files after filtering")]
    NoEligibleFiles,

    #[error("Could not retrieve any selected file contents")]
    NoRetrievableContent { selected_paths: Vec<String> },

    #[error("Unable to fit repository context into safe token budget: {reason}")]
    ContentTooLarge {
        reason: String,
        candidate_count: usize,
        remaining: usize,
        estimated_tokens: Option<usize>,
        limit: usize,
    },

    #[error("Final output rejected: {reason}")]
    InvalidOutput {
        reason: String,
        details: BTreeMap<String, Value>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepolensError {
    /// Stable kind code for this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::InvalidInput,
            Self::Retrieval(err) => err.kind(),
            Self::Llm(err) => err.kind(),
            Self::NoEligibleFiles | Self::NoRetrievableContent { .. } => ErrorKind::UpstreamError,
            Self::ContentTooLarge { .. } => ErrorKind::ContentTooLarge,
            Self::InvalidOutput { .. } => ErrorKind::MalformedModelOutput,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Diagnostic details for the failure envelope.
    #[must_use]
    pub fn details(&self) -> BTreeMap<String, Value> {
        let mut details = BTreeMap::new();
        match self {
            Self::Config(ConfigError::InvalidValue { key, value }) => {
                details.insert("key".to_string(), json!(key));
                details.insert("value".to_string(), json!(value));
            }
            Self::Config(_) | Self::NoEligibleFiles | Self::Internal(_) => {}
            Self::Retrieval(err) => err.extend_details(&mut details),
            Self::Llm(err) => err.extend_details(&mut details),
            Self::NoRetrievableContent { selected_paths } => {
                details.insert("selected_paths".to_string(), json!(selected_paths));
            }
            Self::ContentTooLarge {
                candidate_count,
                remaining,
                estimated_tokens,
                limit,
                ..
            } => {
                details.insert("candidate_count".to_string(), json!(candidate_count));
                details.insert("remaining".to_string(), json!(remaining));
                details.insert("estimated_tokens".to_string(), json!(estimated_tokens));
                details.insert("limit".to_string(), json!(limit));
            }
            Self::InvalidOutput { details: extra, .. } => {
                details.extend(extra.clone());
            }
        }
        details
    }

    /// Render this error as the caller-facing failure envelope.
    ///
    /// The message is passed through redaction so credentials embedded in
    /// transport errors never reach the caller.
    #[must_use]
    pub fn to_envelope(&self) -> FailureEnvelope {
        FailureEnvelope::new(
            self.kind(),
            redact_error_message(&self.to_string()),
            self.details(),
        )
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Failures raised by the repository retrieval collaborator.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Invalid repository URL '{url}': expected https://github.com/{{owner}}/{{repo}}")]
    InvalidUrl { url: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Upstream error: {message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("Repository appears empty or has no files")]
    EmptyRepository,

    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),
}

impl RetrievalError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl { .. } => ErrorKind::InvalidInput,
            Self::NotFound { .. } => ErrorKind::UpstreamNotFound,
            Self::RateLimited { .. } => ErrorKind::UpstreamRateLimited,
            Self::Timeout { .. } => ErrorKind::UpstreamTimeout,
            Self::Upstream { .. } | Self::EmptyRepository => ErrorKind::UpstreamError,
            Self::Misconfiguration(_) => ErrorKind::Internal,
        }
    }

    fn extend_details(&self, details: &mut BTreeMap<String, Value>) {
        match self {
            Self::InvalidUrl { url } => {
                details.insert("url".to_string(), json!(redact_error_message(url)));
            }
            Self::NotFound { resource } => {
                details.insert("resource".to_string(), json!(resource));
            }
            Self::RateLimited { attempts } => {
                details.insert("attempts".to_string(), json!(attempts));
            }
            Self::Timeout { duration } => {
                details.insert("timeout_secs".to_string(), json!(duration.as_secs()));
            }
            Self::Upstream { status, .. } => {
                details.insert("status".to_string(), json!(status));
            }
            Self::EmptyRepository | Self::Misconfiguration(_) => {}
        }
    }
}

/// Failures raised by the generative collaborator.
///
/// Timeout, malformed output and provider failures are distinct variants so
/// the pipeline can branch on them (for example, falling back to heuristic
/// selection when the planner misbehaves).
#[derive(Error, Debug)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, unreadable body)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Output could not be parsed or has the wrong value types
    #[error("Malformed model output after {attempts} attempt(s): {reason}")]
    MalformedOutput {
        attempts: u32,
        reason: String,
        raw_preview: String,
    },

    /// Output parsed but its key set differs from the agreed contract
    #[error("Model output keys {actual:?} do not match required {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),
}

impl LlmError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::UpstreamTimeout,
            Self::ProviderQuota(_) => ErrorKind::UpstreamRateLimited,
            Self::MalformedOutput { .. } | Self::SchemaMismatch { .. } => {
                ErrorKind::MalformedModelOutput
            }
            Self::Transport(_) | Self::ProviderAuth(_) | Self::ProviderOutage(_) => {
                ErrorKind::UpstreamError
            }
            Self::Misconfiguration(_) => ErrorKind::Internal,
        }
    }

    /// Whether this failure came from the model's output rather than the provider.
    #[must_use]
    pub fn is_malformed_output(&self) -> bool {
        matches!(
            self,
            Self::MalformedOutput { .. } | Self::SchemaMismatch { .. }
        )
    }

    fn extend_details(&self, details: &mut BTreeMap<String, Value>) {
        match self {
            Self::MalformedOutput {
                attempts,
                raw_preview,
                ..
            } => {
                details.insert("attempts".to_string(), json!(attempts));
                details.insert(
                    "raw_preview".to_string(),
                    json!(redact_error_message(raw_preview)),
                );
            }
            Self::SchemaMismatch { expected, actual } => {
                details.insert("expected_keys".to_string(), json!(expected));
                details.insert("keys".to_string(), json!(actual));
            }
            Self::Timeout { duration } => {
                details.insert("timeout_secs".to_string(), json!(duration.as_secs()));
            }
            _ => {}
        }
    }
}
