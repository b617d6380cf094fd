use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use repolens_config::Config;
use tracing::{debug, info};

use crate::source::RepositorySource;
use crate::types::{FetchedFile, RepoId, SkipReason, TreeEntry};

/// Bounds for one fan-out of content requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub concurrency: usize,
    /// Entries above this size are skipped without a request
    pub max_file_bytes: u64,
}

impl FetchLimits {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.concurrency.retrieval,
            max_file_bytes: config.limits.max_file_bytes,
        }
    }
}

/// Fetch the selected paths concurrently and return them in selection order.
///
/// Paths missing from `tree` are ignored. Individual failures come back as
/// skipped files and never abort sibling requests.
pub async fn fetch_selected(
    source: &dyn RepositorySource,
    repo: &RepoId,
    git_ref: &str,
    selected: &[String],
    tree: &[TreeEntry],
    limits: FetchLimits,
) -> Vec<FetchedFile> {
    let by_path: HashMap<&str, &TreeEntry> =
        tree.iter().map(|entry| (entry.path.as_str(), entry)).collect();
    let wanted: Vec<(usize, &TreeEntry)> = selected
        .iter()
        .filter_map(|path| by_path.get(path.as_str()).copied())
        .enumerate()
        .collect();

    let mut results: Vec<(usize, FetchedFile)> = stream::iter(wanted)
        .map(|(idx, entry)| async move {
            if entry.size > limits.max_file_bytes {
                return (idx, FetchedFile::skipped(&entry.path, SkipReason::FileTooLarge));
            }
            (idx, source.fetch_file(repo, git_ref, entry).await)
        })
        .buffer_unordered(limits.concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);
    let files: Vec<FetchedFile> = results.into_iter().map(|(_, file)| file).collect();

    for file in &files {
        if let Some(reason) = file.skip_reason() {
            debug!(path = %file.path, reason = %reason, "Skipped selected file");
        }
    }
    info!(
        requested = files.len(),
        usable = files.iter().filter(|f| f.usable_content().is_some()).count(),
        "Fetched selected files"
    );

    files
}
