use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use repolens_utils::error::ConfigError;

use super::{ConfigSource, Environment};
use crate::model::Config;

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub model: Option<String>,
    pub max_selected_files: Option<usize>,
    pub environment: Option<Environment>,
    pub enable_judge: Option<bool>,
}

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    limits: Option<TomlLimits>,
    concurrency: Option<TomlConcurrency>,
    timeouts: Option<TomlTimeouts>,
    llm: Option<TomlLlm>,
    github: Option<TomlGithub>,
    mode: Option<TomlMode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlLimits {
    max_selected_files: Option<usize>,
    max_file_bytes: Option<u64>,
    max_file_tokens: Option<usize>,
    chunk_tokens: Option<usize>,
    safe_context_tokens: Option<usize>,
    planner_listing_tokens: Option<usize>,
    raw_file_max_chars: Option<usize>,
    safety_margin_tokens: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConcurrency {
    retrieval: Option<usize>,
    generation: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlTimeouts {
    retrieval_secs: Option<u64>,
    generation_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlLlm {
    base_url: Option<String>,
    model: Option<String>,
    api_key_env: Option<String>,
    temperature: Option<f32>,
    max_output_tokens_planner: Option<u32>,
    max_output_tokens_chunk: Option<u32>,
    max_output_tokens_final: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlGithub {
    api_base: Option<String>,
    token_env: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlMode {
    environment: Option<Environment>,
    enable_judge: Option<bool>,
    eval_model: Option<String>,
}

/// Overwrite `slot` when `value` is present and record the source of `key`.
fn apply<T>(
    slot: &mut T,
    value: Option<T>,
    key: &str,
    source: &ConfigSource,
    attribution: &mut HashMap<String, ConfigSource>,
) {
    if let Some(value) = value {
        *slot = value;
        attribution.insert(key.to_string(), source.clone());
    }
}

impl Config {
    /// Discover configuration using the current directory and process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the config file is unreadable or invalid, an
    /// environment override cannot be parsed, or a resolved value fails validation.
    pub fn discover(cli: &CliOverrides) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir().map_err(|e| {
            ConfigError::InvalidFile(format!("Failed to get current directory: {e}"))
        })?;
        Self::discover_from(&start_dir, cli, |key| std::env::var(key).ok())
    }

    /// Path-driven variant of [`discover()`](Self::discover).
    ///
    /// `env` looks up environment variables, so tests can supply a fixed map
    /// instead of mutating process-global state.
    ///
    /// # Errors
    ///
    /// See [`discover()`](Self::discover).
    pub fn discover_from<F>(
        start_dir: &Path,
        cli: &CliOverrides,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let mut attribution = HashMap::new();

        let config_path = match &cli.config_path {
            Some(explicit) => Some(explicit.clone()),
            None => Self::discover_config_file_from(start_dir),
        };

        if let Some(path) = &config_path {
            let file = Self::load_config_file(path)?;
            config.apply_file(file, &ConfigSource::Config(path.clone()), &mut attribution);
        }

        config.apply_env(&env, &mut attribution)?;

        let cli_source = ConfigSource::Cli;
        apply(
            &mut config.llm.model,
            cli.model.clone(),
            "llm.model",
            &cli_source,
            &mut attribution,
        );
        apply(
            &mut config.limits.max_selected_files,
            cli.max_selected_files,
            "limits.max_selected_files",
            &cli_source,
            &mut attribution,
        );
        apply(
            &mut config.mode.environment,
            cli.environment,
            "mode.environment",
            &cli_source,
            &mut attribution,
        );
        apply(
            &mut config.mode.enable_judge,
            cli.enable_judge,
            "mode.enable_judge",
            &cli_source,
            &mut attribution,
        );

        config.source_attribution = attribution;
        config.validate()?;
        Ok(config)
    }

    /// Search upward from `start_dir` for `.repolens/config.toml`.
    ///
    /// The search stops at the filesystem root or at a repository root marker
    /// (`.git`, `.hg`, `.svn`).
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current = Some(start_dir);

        while let Some(dir) = current {
            let candidate = dir.join(".repolens").join("config.toml");
            if candidate.is_file() {
                return Some(candidate);
            }
            if dir.join(".git").exists() || dir.join(".hg").exists() || dir.join(".svn").exists()
            {
                break;
            }
            current = dir.parent();
        }

        None
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidFile(format!("Failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            ConfigError::InvalidFile(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    fn apply_file(
        &mut self,
        file: TomlConfig,
        source: &ConfigSource,
        attr: &mut HashMap<String, ConfigSource>,
    ) {
        if let Some(l) = file.limits {
            let limits = &mut self.limits;
            apply(&mut limits.max_selected_files, l.max_selected_files, "limits.max_selected_files", source, attr);
            apply(&mut limits.max_file_bytes, l.max_file_bytes, "limits.max_file_bytes", source, attr);
            apply(&mut limits.max_file_tokens, l.max_file_tokens, "limits.max_file_tokens", source, attr);
            apply(&mut limits.chunk_tokens, l.chunk_tokens, "limits.chunk_tokens", source, attr);
            apply(&mut limits.safe_context_tokens, l.safe_context_tokens, "limits.safe_context_tokens", source, attr);
            apply(&mut limits.planner_listing_tokens, l.planner_listing_tokens, "limits.planner_listing_tokens", source, attr);
            apply(&mut limits.raw_file_max_chars, l.raw_file_max_chars, "limits.raw_file_max_chars", source, attr);
            apply(&mut limits.safety_margin_tokens, l.safety_margin_tokens, "limits.safety_margin_tokens", source, attr);
        }

        if let Some(c) = file.concurrency {
            apply(&mut self.concurrency.retrieval, c.retrieval, "concurrency.retrieval", source, attr);
            apply(&mut self.concurrency.generation, c.generation, "concurrency.generation", source, attr);
        }

        if let Some(t) = file.timeouts {
            apply(&mut self.timeouts.retrieval_secs, t.retrieval_secs, "timeouts.retrieval_secs", source, attr);
            apply(&mut self.timeouts.generation_secs, t.generation_secs, "timeouts.generation_secs", source, attr);
        }

        if let Some(llm) = file.llm {
            let s = &mut self.llm;
            apply(&mut s.base_url, llm.base_url, "llm.base_url", source, attr);
            apply(&mut s.model, llm.model, "llm.model", source, attr);
            apply(&mut s.api_key_env, llm.api_key_env, "llm.api_key_env", source, attr);
            apply(&mut s.temperature, llm.temperature, "llm.temperature", source, attr);
            apply(&mut s.max_output_tokens_planner, llm.max_output_tokens_planner, "llm.max_output_tokens_planner", source, attr);
            apply(&mut s.max_output_tokens_chunk, llm.max_output_tokens_chunk, "llm.max_output_tokens_chunk", source, attr);
            apply(&mut s.max_output_tokens_final, llm.max_output_tokens_final, "llm.max_output_tokens_final", source, attr);
        }

        if let Some(gh) = file.github {
            apply(&mut self.github.api_base, gh.api_base, "github.api_base", source, attr);
            apply(&mut self.github.token_env, gh.token_env, "github.token_env", source, attr);
        }

        if let Some(mode) = file.mode {
            apply(&mut self.mode.environment, mode.environment, "mode.environment", source, attr);
            apply(&mut self.mode.enable_judge, mode.enable_judge, "mode.enable_judge", source, attr);
            apply(&mut self.mode.eval_model, mode.eval_model, "mode.eval_model", source, attr);
        }
    }

    fn apply_env<F>(
        &mut self,
        env: &F,
        attr: &mut HashMap<String, ConfigSource>,
    ) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| env(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let source = |var: &str| ConfigSource::Env(var.to_string());

        if let Some(raw) = read("REPOLENS_ENVIRONMENT") {
            let parsed = Environment::from_str(&raw).map_err(|_| ConfigError::InvalidValue {
                key: "mode.environment".to_string(),
                value: format!("Unknown environment '{raw}' (expected prod, test, or eval)"),
            })?;
            apply(&mut self.mode.environment, Some(parsed), "mode.environment", &source("REPOLENS_ENVIRONMENT"), attr);
        }

        if let Some(raw) = read("REPOLENS_ENABLE_JUDGE") {
            apply(&mut self.mode.enable_judge, Some(raw == "1"), "mode.enable_judge", &source("REPOLENS_ENABLE_JUDGE"), attr);
        }

        apply(&mut self.llm.model, read("REPOLENS_MODEL"), "llm.model", &source("REPOLENS_MODEL"), attr);
        apply(&mut self.mode.eval_model, read("REPOLENS_EVAL_MODEL"), "mode.eval_model", &source("REPOLENS_EVAL_MODEL"), attr);
        apply(&mut self.llm.base_url, read("REPOLENS_LLM_BASE_URL"), "llm.base_url", &source("REPOLENS_LLM_BASE_URL"), attr);
        apply(&mut self.github.api_base, read("REPOLENS_GITHUB_API"), "github.api_base", &source("REPOLENS_GITHUB_API"), attr);

        Ok(())
    }
}
