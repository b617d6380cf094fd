//! Structured calls: prompt in, typed value out.

use std::sync::Arc;
use std::time::Duration;

use repolens_config::Config;
use serde_json::Value;
use tracing::{debug, warn};

use crate::LlmError;
use crate::json_recovery::recover_json_object;
use crate::schema::{SchemaViolation, StructuredOutput};
use crate::types::{LlmBackend, LlmInvocation, Message};

/// Appended to the user instruction when the first answer was unusable.
pub const REMINDER_SUFFIX: &str =
    "\n\nREMINDER: Return valid JSON only with the exact requested keys.";

const RAW_PREVIEW_CHARS: usize = 300;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// A typed value plus the number of backend calls it took.
#[derive(Debug, Clone)]
pub struct StructuredOutcome<T> {
    pub value: T,
    pub attempts: u32,
}

/// Issues structured requests against a backend.
///
/// Retry policy per call: at most one retry after a timeout (after a short
/// delay) and at most one retry after malformed output (with
/// [`REMINDER_SUFFIX`] appended). Provider failures are returned as-is.
#[derive(Clone)]
pub struct StructuredClient {
    backend: Arc<dyn LlmBackend>,
    model: String,
    timeout: Duration,
    temperature: f32,
    retry_delay: Duration,
}

impl std::fmt::Debug for StructuredClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredClient")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl StructuredClient {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            backend,
            model: model.into(),
            timeout,
            temperature: 0.0,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Client for the generation model with the configured timeout and temperature.
    #[must_use]
    pub fn from_config(backend: Arc<dyn LlmBackend>, config: &Config) -> Self {
        Self::new(backend, config.llm.model.clone(), config.generation_timeout())
            .with_temperature(config.llm.temperature)
    }

    /// Same backend and policy, different model.
    #[must_use]
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request a `T` from the model.
    ///
    /// # Errors
    ///
    /// - `LlmError::Timeout` when both the first call and its retry time out
    /// - `LlmError::MalformedOutput` / `LlmError::SchemaMismatch` when the
    ///   reminder retry is also unusable
    /// - any provider error from the backend, unretried
    pub async fn call<T: StructuredOutput>(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<StructuredOutcome<T>, LlmError> {
        let mut attempts: u32 = 0;
        let mut timeout_retried = false;
        let mut with_reminder = false;

        loop {
            attempts += 1;
            let user_text = if with_reminder {
                format!("{user}{REMINDER_SUFFIX}")
            } else {
                user.to_string()
            };
            let inv = LlmInvocation::new(
                self.model.clone(),
                self.timeout,
                vec![Message::system(system), Message::user(user_text)],
                max_tokens,
            )
            .with_temperature(self.temperature);

            let raw = match self.backend.invoke(inv).await {
                Ok(result) => result.raw_response,
                Err(LlmError::Timeout { duration }) if !timeout_retried => {
                    warn!(model = %self.model, attempt = attempts, ?duration, "Generation timed out, retrying");
                    timeout_retried = true;
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
                Err(err) => return Err(err),
            };

            match parse_output::<T>(&raw, attempts) {
                Ok(value) => {
                    debug!(model = %self.model, attempts, "Structured output accepted");
                    return Ok(StructuredOutcome { value, attempts });
                }
                Err(err) if !with_reminder => {
                    warn!(model = %self.model, attempt = attempts, error = %err, "Unusable model output, retrying with reminder");
                    with_reminder = true;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn parse_output<T: StructuredOutput>(raw: &str, attempts: u32) -> Result<T, LlmError> {
    let malformed = |reason: String| LlmError::MalformedOutput {
        attempts,
        reason,
        raw_preview: raw.chars().take(RAW_PREVIEW_CHARS).collect(),
    };

    let obj = recover_json_object(raw)
        .ok_or_else(|| malformed("no JSON object found in model output".to_string()))?;

    match T::schema().validate(&obj) {
        Ok(()) => {}
        Err(SchemaViolation::KeyMismatch { expected, actual }) => {
            return Err(LlmError::SchemaMismatch { expected, actual });
        }
        Err(violation) => return Err(malformed(violation.to_string())),
    }

    serde_json::from_value(Value::Object(obj)).map_err(|e| malformed(e.to_string()))
}
