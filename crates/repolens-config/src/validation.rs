use repolens_utils::error::ConfigError;

use crate::model::Config;

/// Upper bound for either worker pool.
const MAX_CONCURRENCY: usize = 64;

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    }
}

impl Config {
    /// Validate resolved configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.limits;

        let positive = [
            ("limits.max_selected_files", l.max_selected_files),
            ("limits.max_file_tokens", l.max_file_tokens),
            ("limits.chunk_tokens", l.chunk_tokens),
            ("limits.safe_context_tokens", l.safe_context_tokens),
            ("limits.planner_listing_tokens", l.planner_listing_tokens),
            ("limits.raw_file_max_chars", l.raw_file_max_chars),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(invalid(key, "must be greater than 0"));
            }
        }
        if l.max_file_bytes == 0 {
            return Err(invalid("limits.max_file_bytes", "must be greater than 0"));
        }

        if l.chunk_tokens > l.max_file_tokens {
            return Err(invalid(
                "limits.chunk_tokens",
                format!(
                    "{} exceeds limits.max_file_tokens ({})",
                    l.chunk_tokens, l.max_file_tokens
                ),
            ));
        }

        let reserved = self.llm.max_output_tokens_final as usize + l.safety_margin_tokens;
        if l.safe_context_tokens <= reserved {
            return Err(invalid(
                "limits.safe_context_tokens",
                format!("{} cannot hold the reserved output allowance of {reserved}", l.safe_context_tokens),
            ));
        }

        for (key, value) in [
            ("concurrency.retrieval", self.concurrency.retrieval),
            ("concurrency.generation", self.concurrency.generation),
        ] {
            if value == 0 || value > MAX_CONCURRENCY {
                return Err(invalid(key, format!("must be between 1 and {MAX_CONCURRENCY}")));
            }
        }

        for (key, value) in [
            ("timeouts.retrieval_secs", self.timeouts.retrieval_secs),
            ("timeouts.generation_secs", self.timeouts.generation_secs),
        ] {
            if value == 0 || value > 600 {
                return Err(invalid(key, "must be between 1 and 600 seconds"));
            }
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(invalid("llm.temperature", "must be between 0.0 and 2.0"));
        }

        for (key, value) in [
            ("llm.base_url", &self.llm.base_url),
            ("github.api_base", &self.github.api_base),
        ] {
            if !(value.starts_with("https://") || value.starts_with("http://")) {
                return Err(invalid(key, format!("'{value}' is not an http(s) URL")));
            }
        }

        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::MissingRequired("llm.model".to_string()));
        }

        Ok(())
    }
}
