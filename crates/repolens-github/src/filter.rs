use repolens_utils::paths::should_skip;

use crate::types::TreeEntry;

/// Drop vendored, generated, cache, and binary entries.
#[must_use]
pub fn prefilter_tree(entries: &[TreeEntry]) -> Vec<TreeEntry> {
    entries
        .iter()
        .filter(|entry| !should_skip(&entry.path))
        .cloned()
        .collect()
}
