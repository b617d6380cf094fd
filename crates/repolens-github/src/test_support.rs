//! In-memory repository for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::RetrievalError;
use crate::source::RepositorySource;
use crate::types::{FetchedFile, RepoId, SkipReason, TreeEntry};

/// Repository snapshot held in memory. Entry sizes default to the content
/// length in bytes.
#[derive(Default)]
pub struct InMemoryRepository {
    default_ref: String,
    entries: Vec<TreeEntry>,
    contents: HashMap<String, String>,
    latency_ms: HashMap<String, u64>,
    failures: HashMap<String, SkipReason>,
    fetches: AtomicUsize,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_ref: "main".to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        let entry = TreeEntry::new(path, content.len() as u64);
        self.with_entry(entry, content)
    }

    #[must_use]
    pub fn with_entry(mut self, entry: TreeEntry, content: &str) -> Self {
        self.contents.insert(entry.path.clone(), content.to_string());
        self.entries.push(entry);
        self
    }

    /// Delay the fetch of `path` by `millis`.
    #[must_use]
    pub fn with_latency(mut self, path: &str, millis: u64) -> Self {
        self.latency_ms.insert(path.to_string(), millis);
        self
    }

    /// Make the fetch of `path` come back skipped.
    #[must_use]
    pub fn with_failure(mut self, path: &str, reason: SkipReason) -> Self {
        self.failures.insert(path.to_string(), reason);
        self
    }

    #[must_use]
    pub fn tree(&self) -> Vec<TreeEntry> {
        self.entries.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositorySource for InMemoryRepository {
    async fn default_ref(&self, _repo: &RepoId) -> Result<String, RetrievalError> {
        Ok(self.default_ref.clone())
    }

    async fn list_tree(
        &self,
        _repo: &RepoId,
        _git_ref: &str,
    ) -> Result<Vec<TreeEntry>, RetrievalError> {
        if self.entries.is_empty() {
            return Err(RetrievalError::EmptyRepository);
        }
        Ok(self.entries.clone())
    }

    async fn fetch_file(&self, _repo: &RepoId, _git_ref: &str, entry: &TreeEntry) -> FetchedFile {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(millis) = self.latency_ms.get(&entry.path) {
            tokio::time::sleep(Duration::from_millis(*millis)).await;
        }
        if let Some(reason) = self.failures.get(&entry.path) {
            return FetchedFile::skipped(&entry.path, *reason);
        }
        match self.contents.get(&entry.path) {
            Some(text) => FetchedFile::with_content(&entry.path, text),
            None => FetchedFile::skipped(&entry.path, SkipReason::MissingFile),
        }
    }
}
