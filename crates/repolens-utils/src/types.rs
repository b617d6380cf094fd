//! Shared wire types: stable error kinds and the failure envelope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable, caller-visible classification of a terminal failure.
///
/// The serialized form (`snake_case`) is part of the public contract and must
/// not change between releases.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed repository identifier or invalid configuration.
    InvalidInput,
    /// The repository or reference does not exist upstream.
    UpstreamNotFound,
    /// The code host refused the request because of rate limiting.
    UpstreamRateLimited,
    /// An upstream call (retrieval or generation) timed out after retries.
    UpstreamTimeout,
    /// Any other upstream failure, including unusable repositories.
    UpstreamError,
    /// The generative collaborator produced output that violates the contract.
    MalformedModelOutput,
    /// Assembled context cannot be fit under the token ceiling.
    ContentTooLarge,
    /// Unexpected internal failure.
    Internal,
}

impl ErrorKind {
    /// Stable string code for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Body of a failure envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureBody {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default)]
    pub details: BTreeMap<String, serde_json::Value>,
}

/// Structured failure returned to callers instead of the three-key result.
///
/// Serializes as `{"error": {"kind": ..., "message": ..., "details": {...}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEnvelope {
    pub error: FailureBody,
}

impl FailureEnvelope {
    #[must_use]
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        details: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            error: FailureBody {
                kind,
                message: message.into(),
                details,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;
    use strum::VariantNames;

    #[test]
    fn test_error_kind_codes_are_snake_case() {
        assert_eq!(ErrorKind::UpstreamRateLimited.as_str(), "upstream_rate_limited");
        assert_eq!(ErrorKind::MalformedModelOutput.to_string(), "malformed_model_output");
        assert_eq!(
            ErrorKind::from_str("content_too_large").unwrap(),
            ErrorKind::ContentTooLarge
        );
        assert_eq!(ErrorKind::VARIANTS.len(), 8);
    }

    #[test]
    fn test_envelope_serialization_shape() {
        let mut details = BTreeMap::new();
        details.insert("path".to_string(), json!("src/app.py"));
        let envelope = FailureEnvelope::new(ErrorKind::InvalidInput, "bad url", details);

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "error": {
                    "kind": "invalid_input",
                    "message": "bad url",
                    "details": {"path": "src/app.py"}
                }
            })
        );
    }
}
