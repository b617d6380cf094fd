//! Exit code constants and error kind mapping for the repolens CLI.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Kind |
//! |------|----------|------|
//! | 0 | `SUCCESS` | - |
//! | 1 | `INTERNAL` | `internal` |
//! | 2 | `INVALID_INPUT` | `invalid_input` |
//! | 7 | `CONTENT_TOO_LARGE` | `content_too_large` |
//! | 69 | `UPSTREAM` | `upstream_*` |
//! | 70 | `MALFORMED_OUTPUT` | `malformed_model_output` |

use crate::error::RepolensError;
use crate::types::ErrorKind;

/// Process exit code.
///
/// The numeric values are part of the CLI contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - summary produced
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// Invalid repository URL, CLI arguments, or configuration
    pub const INVALID_INPUT: ExitCode = ExitCode(2);

    /// Context could not be fit under the token ceiling
    pub const CONTENT_TOO_LARGE: ExitCode = ExitCode(7);

    /// Code host or model provider failed (not found, rate limited, timeout, error)
    pub const UPSTREAM: ExitCode = ExitCode(69);

    /// Model output violated the structured contract
    pub const MALFORMED_OUTPUT: ExitCode = ExitCode(70);

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Exit code for a failure kind.
    #[must_use]
    pub const fn for_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidInput => Self::INVALID_INPUT,
            ErrorKind::ContentTooLarge => Self::CONTENT_TOO_LARGE,
            ErrorKind::UpstreamNotFound
            | ErrorKind::UpstreamRateLimited
            | ErrorKind::UpstreamTimeout
            | ErrorKind::UpstreamError => Self::UPSTREAM,
            ErrorKind::MalformedModelOutput => Self::MALFORMED_OUTPUT,
            ErrorKind::Internal => Self::INTERNAL,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl RepolensError {
    /// Map this error to a CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::for_kind(self.kind())
    }
}
