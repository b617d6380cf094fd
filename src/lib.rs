//! repolens - grounded GitHub repository summaries
//!
//! Given a repository URL, repolens produces a three-key result
//! (`summary`, `technologies`, `structure`) whose factual claims are checked
//! against the files it actually retrieved.
//!
//! The pipeline runs in fixed stages:
//!
//! 1. list and prefilter the repository tree
//! 2. select at most K files (planner model, deterministic fallback)
//! 3. fetch the selection with bounded concurrency
//! 4. replace oversized files with chunk digests
//! 5. extract technology evidence from manifests and extensions
//! 6. fit the rendered context under the token ceiling
//! 7. generate a draft with a strict three-key schema
//! 8. ground the draft against the evidence
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! export NEBIUS_API_KEY=...
//! repolens summarize https://github.com/psf/requests --pretty
//! repolens config
//! ```
//!
//! # Quick Start (Library)
//!
//! ```no_run
//! use std::sync::Arc;
//! use repolens::{Config, RepositorySummarizer};
//!
//! # async fn demo() -> Result<(), repolens::RepolensError> {
//! let config = Arc::new(Config::default());
//! let summarizer = RepositorySummarizer::from_config(config)?;
//! let run = summarizer.summarize("https://github.com/psf/requests").await?;
//! println!("{}", run.response().summary);
//! # Ok(())
//! # }
//! ```

pub mod cli;

pub use repolens_config::{CliOverrides, Config, ConfigSource, Environment};
pub use repolens_engine::{
    EvaluationReport, GroundingReport, Judge, RepositorySummarizer, SummaryResponse, SummaryRun,
};
pub use repolens_utils::{ErrorKind, ExitCode, FailureEnvelope, RepolensError};

#[doc(hidden)]
pub use repolens_engine as engine;
#[doc(hidden)]
pub use repolens_evidence as evidence;
#[doc(hidden)]
pub use repolens_github as github;
#[doc(hidden)]
pub use repolens_llm as llm;
#[doc(hidden)]
pub use repolens_packet as packet;
#[doc(hidden)]
pub use repolens_selectors as selectors;
