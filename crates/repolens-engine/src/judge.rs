//! Evaluation-mode grading of a finished summary.
//!
//! The judge never influences the caller-facing result: any failure is
//! logged and the verdict is simply absent.

use repolens_evidence::SummaryResponse;
use repolens_llm::{JudgeVerdict, StructuredClient};
use repolens_utils::redaction::redact_error_message;
use serde::Serialize;
use tracing::{info, warn};

use crate::prompts::{JUDGE_SYSTEM_PROMPT, judge_user_prompt};

/// Output allowance for the judge call.
pub const JUDGE_MAX_TOKENS: u32 = 500;

/// Diagnostics printed alongside a result in evaluation mode.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judge: Option<JudgeVerdict>,
}

/// Grades results with a second, usually larger, model.
#[derive(Debug, Clone)]
pub struct Judge {
    client: StructuredClient,
}

impl Judge {
    /// Judge that calls `eval_model` through the same backend as `client`.
    #[must_use]
    pub fn new(client: &StructuredClient, eval_model: &str) -> Self {
        Self {
            client: client.with_model(eval_model),
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Grade `response` for the repository at `url`.
    pub async fn grade(&self, url: &str, response: &SummaryResponse) -> Option<JudgeVerdict> {
        let payload = match serde_json::to_string(response) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "Could not serialize payload for the judge");
                return None;
            }
        };

        let user = judge_user_prompt(url, &payload);
        match self
            .client
            .call::<JudgeVerdict>(JUDGE_SYSTEM_PROMPT, &user, JUDGE_MAX_TOKENS)
            .await
        {
            Ok(outcome) => {
                let verdict = outcome.value.normalized();
                info!(
                    model = %self.client.model(),
                    overall = verdict.overall,
                    flags = verdict.hallucination_flags.len(),
                    attempts = outcome.attempts,
                    "Judge graded summary"
                );
                Some(verdict)
            }
            Err(err) => {
                warn!(
                    model = %self.client.model(),
                    error = %redact_error_message(&err.to_string()),
                    "Judge failed; result is unaffected"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repolens_llm::LlmError;
    use repolens_llm::test_support::ScriptedBackend;
    use std::sync::Arc;
    use std::time::Duration;

    fn response() -> SummaryResponse {
        SummaryResponse {
            summary: "A Flask service.".into(),
            technologies: vec!["Python".into(), "Flask".into()],
            structure: vec!["src/app.py: entrypoint".into()],
        }
    }

    fn judge(backend: Arc<ScriptedBackend>) -> Judge {
        let client = StructuredClient::new(backend, "draft-model", Duration::from_secs(5))
            .with_retry_delay(Duration::ZERO);
        Judge::new(&client, "eval-model")
    }

    #[tokio::test]
    async fn test_verdict_is_normalized() {
        let backend = Arc::new(ScriptedBackend::sequence(vec![Ok(r#"{
            "overall": 1.7,
            "hallucination_flags": ["  ", " invented route "],
            "scores": {"faithful": 0.9, "completeness": 0.8, "structure": 0.7},
            "notes": " fine "
        }"#
        .to_string())]));
        let verdict = judge(backend.clone())
            .grade("https://github.com/o/r", &response())
            .await
            .unwrap();

        assert!((verdict.overall - 1.0).abs() < f64::EPSILON);
        assert_eq!(verdict.hallucination_flags, vec!["invented route"]);
        assert_eq!(verdict.notes, serde_json::json!("fine"));

        let inv = &backend.invocations()[0];
        assert_eq!(inv.model, "eval-model");
        assert!(inv.user_text().contains("Repository URL: https://github.com/o/r"));
        assert!(inv.user_text().contains("\"summary\":\"A Flask service.\""));
    }

    #[tokio::test]
    async fn test_failure_yields_no_verdict() {
        let backend = Arc::new(ScriptedBackend::sequence(vec![Err(
            LlmError::ProviderAuth("bad key".to_string()),
        )]));
        let verdict = judge(backend.clone())
            .grade("https://github.com/o/r", &response())
            .await;
        assert!(verdict.is_none());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_wrong_keys_retry_once_then_give_up() {
        let backend = Arc::new(ScriptedBackend::sequence(vec![
            Ok(r#"{"overall": 0.5}"#.to_string()),
            Ok(r#"{"score": 0.5}"#.to_string()),
        ]));
        let verdict = judge(backend.clone())
            .grade("https://github.com/o/r", &response())
            .await;
        assert!(verdict.is_none());
        assert_eq!(backend.call_count(), 2);
    }
}
