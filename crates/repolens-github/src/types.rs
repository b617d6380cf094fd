use serde::{Deserialize, Serialize};
use std::fmt;

/// `owner/name` pair identifying a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One blob in a tree snapshot. `path` is unique within the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub size: u64,
}

impl TreeEntry {
    #[must_use]
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// Why a selected file carries no content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    FileTooLarge,
    MissingFile,
    Http(u16),
    InvalidJson,
    FileDecodeError,
    UnsupportedContentEncoding,
    Timeout,
    UpstreamError,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileTooLarge => f.write_str("FILE_TOO_LARGE"),
            Self::MissingFile => f.write_str("MISSING_FILE"),
            Self::Http(status) => write!(f, "HTTP_{status}"),
            Self::InvalidJson => f.write_str("INVALID_JSON"),
            Self::FileDecodeError => f.write_str("FILE_DECODE_ERROR"),
            Self::UnsupportedContentEncoding => f.write_str("UNSUPPORTED_CONTENT_ENCODING"),
            Self::Timeout => f.write_str("TIMEOUT"),
            Self::UpstreamError => f.write_str("UPSTREAM_ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Content(String),
    Skipped(SkipReason),
}

/// Result of retrieving one selected path.
///
/// A skipped file has no content, so it can never leak into text assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub path: String,
    pub outcome: FetchOutcome,
}

impl FetchedFile {
    #[must_use]
    pub fn with_content(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            outcome: FetchOutcome::Content(content.into()),
        }
    }

    #[must_use]
    pub fn skipped(path: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            path: path.into(),
            outcome: FetchOutcome::Skipped(reason),
        }
    }

    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match &self.outcome {
            FetchOutcome::Content(text) => Some(text),
            FetchOutcome::Skipped(_) => None,
        }
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Skipped(_))
    }

    #[must_use]
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self.outcome {
            FetchOutcome::Skipped(reason) => Some(reason),
            FetchOutcome::Content(_) => None,
        }
    }

    /// Content that is present and non-empty.
    #[must_use]
    pub fn usable_content(&self) -> Option<&str> {
        self.content().filter(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_reason_codes() {
        assert_eq!(SkipReason::FileTooLarge.to_string(), "FILE_TOO_LARGE");
        assert_eq!(SkipReason::Http(502).to_string(), "HTTP_502");
        assert_eq!(
            SkipReason::UnsupportedContentEncoding.to_string(),
            "UNSUPPORTED_CONTENT_ENCODING"
        );
    }

    #[test]
    fn test_fetched_file_accessors() {
        let ok = FetchedFile::with_content("a.py", "print(1)");
        assert_eq!(ok.content(), Some("print(1)"));
        assert!(!ok.is_skipped());

        let skipped = FetchedFile::skipped("b.py", SkipReason::MissingFile);
        assert!(skipped.is_skipped());
        assert_eq!(skipped.content(), None);
        assert_eq!(skipped.skip_reason(), Some(SkipReason::MissingFile));

        assert_eq!(FetchedFile::with_content("c", "").usable_content(), None);
    }

    #[test]
    fn test_repo_id_display() {
        assert_eq!(RepoId::new("psf", "requests").to_string(), "psf/requests");
    }
}
