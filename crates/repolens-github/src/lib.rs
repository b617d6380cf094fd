//! Retrieval collaborator for repolens
//!
//! Resolves a repository URL to a default ref, lists every blob under that
//! ref, and fetches decoded file content. Content retrieval never fails: a
//! file that cannot be used comes back as a [`FetchedFile`] carrying a
//! [`SkipReason`].

mod client;
mod fetch;
mod filter;
mod source;
mod types;
mod url;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use client::GitHubClient;
pub use fetch::{FetchLimits, fetch_selected};
pub use filter::prefilter_tree;
pub use repolens_utils::error::RetrievalError;
pub use source::RepositorySource;
pub use types::{FetchOutcome, FetchedFile, RepoId, SkipReason, TreeEntry};
pub use url::parse_repo_url;
