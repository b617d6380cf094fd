//! Generative collaborator for repolens
//!
//! Exposes a single structured operation: given a system instruction, a user
//! instruction, and an output allowance, return a typed value for a pre-agreed
//! key set. JSON-shape recovery, strict schema validation, and the
//! timeout/malformed-output retry policy all live here, so downstream stages
//! only ever see typed values or a typed [`LlmError`].

mod contracts;
pub(crate) mod http_client;
mod json_recovery;
mod openai_backend;
mod schema;
mod structured;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use contracts::{ChunkDigest, FinalDraft, JudgeVerdict, PlannerOutput, value_to_text};
pub use json_recovery::recover_json_object;
pub use openai_backend::OpenAiCompatBackend;
pub use repolens_utils::error::LlmError;
pub use schema::{FieldType, Schema, SchemaViolation, StructuredOutput};
pub use structured::{REMINDER_SUFFIX, StructuredClient, StructuredOutcome};
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

use repolens_config::Config;
use std::sync::Arc;

/// Build the configured backend.
///
/// # Errors
///
/// Returns `LlmError::Misconfiguration` when the API key variable is unset or
/// the HTTP client cannot be constructed.
pub fn backend_from_config(config: &Config) -> Result<Arc<dyn LlmBackend>, LlmError> {
    Ok(Arc::new(OpenAiCompatBackend::from_config(config)?))
}
