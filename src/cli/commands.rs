//! Command implementations
//!
//! Every command writes its machine-readable result to stdout. Diagnostics
//! and evaluation reports go to stderr.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use repolens_config::Config;
use repolens_engine::RepositorySummarizer;
use repolens_utils::{ExitCode, RepolensError};
use serde::Serialize;
use tracing::warn;

/// Serialize `value` as compact or pretty JSON.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.context("Failed to serialize JSON output")
}

fn write_line(mut out: impl Write, line: &str) -> Result<()> {
    writeln!(out, "{line}").context("Failed to write output")
}

/// Print the failure envelope for `err` on stdout and return its exit code.
pub fn report_failure(err: &RepolensError, pretty: bool) -> ExitCode {
    warn!(kind = %err.kind().as_str(), error = %err, "Summarization failed");
    let printed = to_json(&err.to_envelope(), pretty)
        .and_then(|json| write_line(std::io::stdout().lock(), &json));
    if let Err(io_err) = printed {
        eprintln!("Failed to print error envelope: {io_err:#}");
    }
    err.to_exit_code()
}

/// Run one summarization and print its result.
pub async fn summarize(config: Config, url: &str, pretty: bool) -> Result<ExitCode> {
    let summarizer = match RepositorySummarizer::from_config(Arc::new(config)) {
        Ok(summarizer) => summarizer,
        Err(err) => return Ok(report_failure(&err, pretty)),
    };

    match summarizer.summarize(url).await {
        Ok(run) => {
            let json = to_json(run.response(), pretty)?;
            write_line(std::io::stdout().lock(), &json)?;
            if let Some(evaluation) = &run.evaluation {
                let report = to_json(evaluation, pretty)?;
                write_line(std::io::stderr().lock(), &report)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(report_failure(&err, pretty)),
    }
}

/// Render the effective configuration as aligned `key = value  (source)` rows.
#[must_use]
pub fn render_config_table(config: &Config) -> String {
    let effective = config.effective_config();
    let width = effective.keys().map(String::len).max().unwrap_or(0);
    effective
        .iter()
        .map(|(key, (value, source))| format!("{key:<width$} = {value}  ({source})"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct ConfigEntry<'a> {
    value: &'a str,
    source: &'a str,
}

/// Print the effective configuration.
pub fn print_config(config: &Config, json: bool) -> Result<()> {
    let rendered = if json {
        let effective = config.effective_config();
        let entries: std::collections::BTreeMap<&str, ConfigEntry<'_>> = effective
            .iter()
            .map(|(key, (value, source))| {
                (
                    key.as_str(),
                    ConfigEntry {
                        value: value.as_str(),
                        source: source.as_str(),
                    },
                )
            })
            .collect();
        to_json(&entries, true)?
    } else {
        render_config_table(config)
    };
    write_line(std::io::stdout().lock(), &rendered)
}
