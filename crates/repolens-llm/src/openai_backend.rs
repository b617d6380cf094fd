//! OpenAI-compatible chat-completions backend
//!
//! Works against any provider exposing `POST {base_url}/chat/completions`
//! with bearer authentication.

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
use async_trait::async_trait;
use repolens_config::Config;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROVIDER: &str = "openai-compat";

#[derive(Clone)]
pub struct OpenAiCompatBackend {
    client: HttpClient,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for OpenAiCompatBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatBackend")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self, LlmError> {
        Ok(Self {
            client: HttpClient::new()?,
            endpoint: chat_completions_endpoint(base_url),
            api_key: api_key.into(),
        })
    }

    /// Build from configuration, reading the key from `llm.api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the key variable is unset or
    /// empty, or the HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let key_env = &config.llm.api_key_env;
        let api_key = std::env::var(key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "API key not found in environment variable '{key_env}'. \
                     Set it or configure a different [llm] api_key_env."
                ))
            })?;
        Self::new(api_key, &config.llm.base_url)
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[cfg(test)]
    fn without_backoff(mut self) -> Self {
        self.client = self.client.with_backoff(std::time::Duration::ZERO);
        self
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage<'_>> {
        messages
            .iter()
            .map(|msg| ChatMessage {
                role: match msg.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: &msg.content,
            })
            .collect()
    }
}

fn chat_completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[async_trait]
impl LlmBackend for OpenAiCompatBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        debug!(
            provider = PROVIDER,
            model = %inv.model,
            max_tokens = inv.max_tokens,
            temperature = inv.temperature,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking chat completion"
        );

        let body = ChatRequest {
            model: &inv.model,
            messages: Self::convert_messages(&inv.messages),
            max_tokens: inv.max_tokens,
            temperature: inv.temperature,
            stream: false,
        };

        let request = self
            .client
            .client()
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, PROVIDER)
            .await?;

        let response_body: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout {
                    duration: inv.timeout,
                }
            } else {
                LlmError::Transport(format!("Failed to parse chat completion response: {e}"))
            }
        })?;

        let choice = response_body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Transport("Response missing choices[0]".to_string()))?;

        // A null content is treated as empty text and surfaces as malformed output.
        let content = choice.message.content.unwrap_or_default();

        let mut result = LlmResult::new(content, PROVIDER, inv.model);
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        debug!(
            provider = PROVIDER,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Chat completion finished"
        );

        Ok(result)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
