//! Turn fetched files into prompt representations.

use repolens_config::Config;
use repolens_github::FetchedFile;
use repolens_utils::tokens::{estimate_tokens, truncate_for_prompt};
use tracing::debug;

use crate::model::FileRepresentation;
use crate::summarizer::ChunkSummarizer;

/// Builds one [`FileRepresentation`] per usable fetched file.
///
/// Files estimated above `max_file_tokens` are replaced by a chunk digest;
/// everything else is kept raw, cut to `raw_file_max_chars`.
#[derive(Debug, Clone)]
pub struct RepresentationBuilder {
    summarizer: ChunkSummarizer,
    max_file_tokens: usize,
    raw_file_max_chars: usize,
}

impl RepresentationBuilder {
    #[must_use]
    pub fn new(summarizer: ChunkSummarizer, config: &Config) -> Self {
        Self {
            summarizer,
            max_file_tokens: config.limits.max_file_tokens,
            raw_file_max_chars: config.limits.raw_file_max_chars,
        }
    }

    /// Representations for `files`, in their given order.
    ///
    /// Skipped files and files with empty content are left out.
    pub async fn prepare(&self, files: &[FetchedFile]) -> Vec<FileRepresentation> {
        let mut prepared = Vec::with_capacity(files.len());
        for file in files {
            let Some(content) = file.usable_content() else {
                continue;
            };
            let tokens = estimate_tokens(content);
            if tokens > self.max_file_tokens {
                let digest = self.summarizer.summarize(&file.path, content).await;
                debug!(
                    path = %file.path,
                    estimated_tokens = tokens,
                    digest_chars = digest.len(),
                    "Replaced oversized file with chunk summary"
                );
                prepared.push(FileRepresentation::chunk_summary(&file.path, digest));
            } else {
                prepared.push(FileRepresentation::raw(
                    &file.path,
                    truncate_for_prompt(content, self.raw_file_max_chars),
                ));
            }
        }
        prepared
    }
}
