use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::sources::ConfigSource;

/// Default OpenAI-compatible endpoint for generation.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.tokenfactory.nebius.com/v1/";

/// Default model used for planning, chunk digests, and final synthesis.
pub const DEFAULT_MODEL: &str = "meta-llama/Meta-Llama-3.1-8B-Instruct";

/// Default model used by the evaluation judge.
pub const DEFAULT_EVAL_MODEL: &str = "Meta/Llama-3.3-70B-Instruct";

/// Default GitHub REST API root.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Size and token ceilings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum number of files the selector may return (K)
    pub max_selected_files: usize,
    /// Files larger than this are skipped without requesting content
    pub max_file_bytes: u64,
    /// Files estimated above this many tokens are chunk-summarized
    pub max_file_tokens: usize,
    /// Target token budget for a single chunk
    pub chunk_tokens: usize,
    /// Global ceiling for the final generation request
    pub safe_context_tokens: usize,
    /// Token budget for the planner's tree listing
    pub planner_listing_tokens: usize,
    /// Raw file text is cut to this many characters
    pub raw_file_max_chars: usize,
    /// Fixed slack added to every final-request estimate
    pub safety_margin_tokens: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_selected_files: 10,
            max_file_bytes: 200_000,
            max_file_tokens: 8_000,
            chunk_tokens: 2_000,
            safe_context_tokens: 100_000,
            planner_listing_tokens: 35_000,
            raw_file_max_chars: 12_000,
            safety_margin_tokens: 256,
        }
    }
}

/// Worker pool sizes, one per external-call class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concurrency {
    pub retrieval: usize,
    pub generation: usize,
}

impl Default for Concurrency {
    fn default() -> Self {
        Self {
            retrieval: 5,
            generation: 3,
        }
    }
}

/// Per-call timeouts in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    pub retrieval_secs: u64,
    pub generation_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            retrieval_secs: 10,
            generation_secs: 60,
        }
    }
}

/// Generative collaborator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    pub max_output_tokens_planner: u32,
    pub max_output_tokens_chunk: u32,
    pub max_output_tokens_final: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "NEBIUS_API_KEY".to_string(),
            temperature: 0.0,
            max_output_tokens_planner: 500,
            max_output_tokens_chunk: 700,
            max_output_tokens_final: 1_000,
        }
    }
}

/// Retrieval collaborator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubSettings {
    pub api_base: String,
    /// Name of the environment variable holding an optional access token
    pub token_env: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API.to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
        }
    }
}

/// Deployment environment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    #[default]
    Prod,
    Test,
    Eval,
}

/// Run mode settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSettings {
    pub environment: Environment,
    /// Grade results with a second model (only honored in `eval`)
    pub enable_judge: bool,
    pub eval_model: String,
}

impl Default for ModeSettings {
    fn default() -> Self {
        Self {
            environment: Environment::Prod,
            enable_judge: false,
            eval_model: DEFAULT_EVAL_MODEL.to_string(),
        }
    }
}

/// Configuration for one repolens process.
///
/// Construct with [`Config::discover()`] for CLI semantics, or start from
/// [`Config::default()`] and override fields for programmatic use. The value
/// is never mutated after construction; components receive `&Config` or an
/// `Arc<Config>`.
///
/// # Configuration File Format
///
/// ```toml
/// [limits]
/// max_selected_files = 10
/// safe_context_tokens = 100000
///
/// [concurrency]
/// retrieval = 5
/// generation = 3
///
/// [llm]
/// model = "meta-llama/Meta-Llama-3.1-8B-Instruct"
///
/// [mode]
/// environment = "eval"
/// enable_judge = true
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub limits: Limits,
    pub concurrency: Concurrency,
    pub timeouts: Timeouts,
    pub llm: LlmSettings,
    pub github: GithubSettings,
    pub mode: ModeSettings,
    /// Where each resolved key came from
    pub source_attribution: HashMap<String, ConfigSource>,
}

impl Config {
    #[must_use]
    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.retrieval_secs)
    }

    #[must_use]
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.generation_secs)
    }

    /// Whether the evaluation judge should run after a successful summary.
    #[must_use]
    pub fn judge_enabled(&self) -> bool {
        self.mode.environment == Environment::Eval && self.mode.enable_judge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.limits.max_selected_files, 10);
        assert_eq!(config.limits.max_file_tokens, 8_000);
        assert_eq!(config.limits.chunk_tokens, 2_000);
        assert_eq!(config.limits.safe_context_tokens, 100_000);
        assert_eq!(config.concurrency.retrieval, 5);
        assert_eq!(config.concurrency.generation, 3);
        assert_eq!(config.generation_timeout(), Duration::from_secs(60));
        assert_eq!(config.llm.max_output_tokens_final, 1_000);
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from_str("eval").unwrap(), Environment::Eval);
        assert_eq!(Environment::from_str("PROD").unwrap(), Environment::Prod);
        assert!(Environment::from_str("staging").is_err());
        assert_eq!(Environment::Test.to_string(), "test");
    }

    #[test]
    fn test_judge_requires_eval_mode() {
        let mut config = Config::default();
        config.mode.enable_judge = true;
        assert!(!config.judge_enabled());
        config.mode.environment = Environment::Eval;
        assert!(config.judge_enabled());
    }
}
