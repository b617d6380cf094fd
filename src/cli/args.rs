//! CLI argument definitions and parsing structures

use clap::{Parser, Subcommand};
use repolens_config::Environment;
use std::path::PathBuf;

/// repolens - grounded summaries of GitHub repositories
#[derive(Debug, Parser)]
#[command(name = "repolens")]
#[command(about = "Summarize a GitHub repository with evidence-grounded claims")]
#[command(long_about = r#"
repolens selects a small, high-signal subset of a repository's files, compresses
oversized files into chunk digests, fits everything under a token ceiling, asks
a language model for a summary, and fact-checks the model's claims against the
retrieved evidence before printing them.

EXAMPLES:
  # Summarize a repository
  repolens summarize https://github.com/psf/requests

  # Pretty-print and allow more files into the context
  repolens summarize https://github.com/psf/requests --pretty --max-files 15

  # Grade the result with the evaluation model (report goes to stderr)
  repolens summarize https://github.com/psf/requests --environment eval --judge

  # Show effective configuration and where each value came from
  repolens config

CONFIGURATION:
  Precedence: CLI flags > environment > config file > defaults
  The config file is discovered by searching upward from the working directory
  for .repolens/config.toml; use --config to name one explicitly.
  The model API key is read from NEBIUS_API_KEY and the optional GitHub token
  from GITHUB_TOKEN (both variable names are configurable).
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model used for planning, chunk digests, and the final summary
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Enable verbose logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarize a repository and print the result as JSON
    Summarize {
        /// Repository URL, e.g. https://github.com/owner/name
        url: String,

        /// Maximum number of files to select
        #[arg(long)]
        max_files: Option<usize>,

        /// Run mode (prod, test, eval)
        #[arg(long)]
        environment: Option<Environment>,

        /// Grade the result with the evaluation model (eval mode only)
        #[arg(long)]
        judge: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the effective configuration with source attribution
    Config {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Build the clap command, for help rendering and argument tests.
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
