use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::Config;

/// Source of a configuration value.
///
/// Precedence (highest first): CLI > environment > config file > defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Cli,
    Env(String),
    Config(PathBuf),
    Default,
}

impl ConfigSource {
    fn label(&self) -> String {
        match self {
            Self::Cli => "cli".to_string(),
            Self::Env(var) => format!("env:{var}"),
            Self::Config(path) => format!("config:{}", path.display()),
            Self::Default => "default".to_string(),
        }
    }
}

impl Config {
    /// Effective configuration as `key -> (value, source)` pairs.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut out = BTreeMap::new();
        let mut add = |key: &str, value: String| {
            let source = self
                .source_attribution
                .get(key)
                .unwrap_or(&ConfigSource::Default)
                .label();
            out.insert(key.to_string(), (value, source));
        };

        let l = &self.limits;
        add("limits.max_selected_files", l.max_selected_files.to_string());
        add("limits.max_file_bytes", l.max_file_bytes.to_string());
        add("limits.max_file_tokens", l.max_file_tokens.to_string());
        add("limits.chunk_tokens", l.chunk_tokens.to_string());
        add("limits.safe_context_tokens", l.safe_context_tokens.to_string());
        add("limits.planner_listing_tokens", l.planner_listing_tokens.to_string());
        add("limits.raw_file_max_chars", l.raw_file_max_chars.to_string());
        add("limits.safety_margin_tokens", l.safety_margin_tokens.to_string());
        add("concurrency.retrieval", self.concurrency.retrieval.to_string());
        add("concurrency.generation", self.concurrency.generation.to_string());
        add("timeouts.retrieval_secs", self.timeouts.retrieval_secs.to_string());
        add("timeouts.generation_secs", self.timeouts.generation_secs.to_string());
        add("llm.base_url", self.llm.base_url.clone());
        add("llm.model", self.llm.model.clone());
        add("llm.api_key_env", self.llm.api_key_env.clone());
        add("llm.temperature", self.llm.temperature.to_string());
        add(
            "llm.max_output_tokens_planner",
            self.llm.max_output_tokens_planner.to_string(),
        );
        add(
            "llm.max_output_tokens_chunk",
            self.llm.max_output_tokens_chunk.to_string(),
        );
        add(
            "llm.max_output_tokens_final",
            self.llm.max_output_tokens_final.to_string(),
        );
        add("github.api_base", self.github.api_base.clone());
        add("github.token_env", self.github.token_env.clone());
        add("mode.environment", self.mode.environment.to_string());
        add("mode.enable_judge", self.mode.enable_judge.to_string());
        add("mode.eval_model", self.mode.eval_model.clone());
        out
    }
}
