use async_trait::async_trait;

use crate::RetrievalError;
use crate::types::{FetchedFile, RepoId, TreeEntry};

/// Read access to a hosted repository snapshot.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Resolve the repository's default branch.
    ///
    /// # Errors
    ///
    /// Returns `RetrievalError` when the repository cannot be resolved.
    async fn default_ref(&self, repo: &RepoId) -> Result<String, RetrievalError>;

    /// List every blob under `git_ref`, in listing order.
    ///
    /// # Errors
    ///
    /// Returns `RetrievalError::EmptyRepository` when no blobs exist, or any
    /// transport/upstream failure.
    async fn list_tree(&self, repo: &RepoId, git_ref: &str)
    -> Result<Vec<TreeEntry>, RetrievalError>;

    /// Fetch decoded text for one entry. Never fails; problems become a
    /// skipped [`FetchedFile`].
    async fn fetch_file(&self, repo: &RepoId, git_ref: &str, entry: &TreeEntry) -> FetchedFile;
}
