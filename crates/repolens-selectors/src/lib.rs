//! File selection for repolens
//!
//! Given the filtered tree and a maximum count K, produce an ordered list of
//! at most K distinct paths, each present in the tree. Selection is delegated
//! to a planner model first; whenever that fails or yields nothing usable, the
//! deterministic [`fallback_selection`] takes over. The fallback never fails
//! on a non-empty tree.

mod fallback;
mod listing;
mod planner;

pub use fallback::{DEPENDENCY_FILES, FOLDER_CAP, fallback_selection};
pub use listing::build_planner_listing;
pub use planner::{PLANNER_SYSTEM_PROMPT, planner_user_prompt, sanitize_planner_paths};

use repolens_config::Config;
use repolens_github::TreeEntry;
use repolens_llm::{PlannerOutput, StructuredClient};
use tracing::{info, warn};

/// How a selection was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum SelectionStrategy {
    Planner,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub paths: Vec<String>,
    pub strategy: SelectionStrategy,
}

impl Selection {
    fn fallback(entries: &[TreeEntry], limit: usize) -> Self {
        Self {
            paths: fallback_selection(entries, limit),
            strategy: SelectionStrategy::Fallback,
        }
    }
}

/// Chooses which files to retrieve.
#[derive(Debug, Clone)]
pub struct FileSelector {
    client: StructuredClient,
    max_selected: usize,
    listing_budget_tokens: usize,
    max_output_tokens: u32,
}

impl FileSelector {
    #[must_use]
    pub fn new(client: StructuredClient, config: &Config) -> Self {
        Self {
            client,
            max_selected: config.limits.max_selected_files,
            listing_budget_tokens: config.limits.planner_listing_tokens,
            max_output_tokens: config.llm.max_output_tokens_planner,
        }
    }

    #[must_use]
    pub fn max_selected(&self) -> usize {
        self.max_selected
    }

    /// Select up to K paths from `entries`.
    pub async fn select(&self, entries: &[TreeEntry]) -> Selection {
        let listing = build_planner_listing(entries, self.listing_budget_tokens);
        if listing.is_empty() {
            warn!("Planner listing is empty, using fallback selection");
            return self.finish(Selection::fallback(entries, self.max_selected));
        }

        let user = planner_user_prompt(&listing, self.max_selected);
        let outcome = self
            .client
            .call::<PlannerOutput>(PLANNER_SYSTEM_PROMPT, &user, self.max_output_tokens)
            .await;

        let selection = match outcome {
            Ok(outcome) => {
                let paths =
                    sanitize_planner_paths(&outcome.value.paths(), entries, self.max_selected);
                if paths.is_empty() {
                    warn!(
                        proposed = outcome.value.important_files.len(),
                        "Planner proposed no usable paths, using fallback selection"
                    );
                    Selection::fallback(entries, self.max_selected)
                } else {
                    Selection {
                        paths,
                        strategy: SelectionStrategy::Planner,
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "Planner call failed, using fallback selection");
                Selection::fallback(entries, self.max_selected)
            }
        };
        self.finish(selection)
    }

    fn finish(&self, selection: Selection) -> Selection {
        info!(
            strategy = %selection.strategy,
            selected = selection.paths.len(),
            limit = self.max_selected,
            "Selected files"
        );
        selection
    }
}
