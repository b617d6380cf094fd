//! Foundation utilities shared by every repolens crate.
//!
//! Holds the error taxonomy and failure envelope, token estimation helpers,
//! list normalization, repository path heuristics, and tracing setup.

pub mod error;
pub mod exit_codes;
pub mod lists;
pub mod logging;
pub mod paths;
pub mod redaction;
pub mod tokens;
pub mod types;

pub use error::{ConfigError, LlmError, RepolensError, RetrievalError};
pub use exit_codes::ExitCode;
pub use types::{ErrorKind, FailureEnvelope};
