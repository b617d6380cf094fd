use serde::Serialize;

/// Where a representation's text came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RepresentationSource {
    /// File content, possibly truncated
    Raw,
    /// Merged digest standing in for a file over the per-file ceiling
    ChunkSummary,
}

/// The text that stands in for one retrieved file in the final prompt.
///
/// Exactly one representation exists per usable fetched file, in selection
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRepresentation {
    pub path: String,
    pub text: String,
    pub source: RepresentationSource,
}

impl FileRepresentation {
    #[must_use]
    pub fn raw(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            source: RepresentationSource::Raw,
        }
    }

    #[must_use]
    pub fn chunk_summary(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            source: RepresentationSource::ChunkSummary,
        }
    }

    #[must_use]
    pub fn is_chunk_summary(&self) -> bool {
        self.source == RepresentationSource::ChunkSummary
    }
}

/// A rendered bundle block paired with the path it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleBlock {
    pub path: String,
    pub block: String,
}
