//! Tracing setup and structured logging helpers.
//!
//! Logs always go to stderr so that the JSON result written to stdout stays
//! machine-readable.

use tracing::{Level, debug, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the filter is `repolens=info,warn`, or
/// `repolens=debug,info` when `verbose` is true. Verbose mode also reports
/// span close events with their durations.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("repolens=debug,info")
            } else {
                EnvFilter::try_new("repolens=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let span_events = if verbose {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .with_span_events(span_events)
                .compact(),
        )
        .try_init()?;

    Ok(())
}

/// Span covering one summarization run.
#[must_use]
pub fn pipeline_span(repo: &str) -> tracing::Span {
    span!(Level::INFO, "summarize", repo = %repo)
}

/// Log completion of a pipeline stage with its duration.
pub fn log_stage_complete(stage: &str, duration_ms: u128) {
    debug!(stage = %stage, duration_ms = %duration_ms, "Stage completed");
}
