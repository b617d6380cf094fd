//! Ordered list normalization.

use std::collections::HashSet;

/// Trim items, drop empties and case-insensitive duplicates (first spelling
/// wins), then cap the list at `max` items. Order is preserved.
#[must_use]
pub fn clamp_list<I, S>(items: I, max: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if out.len() >= max {
            break;
        }
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if !seen.insert(trimmed.to_lowercase()) {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}

/// Append `item` to `list` unless an equal (case-insensitive) entry exists.
///
/// Returns whether the item was added.
pub fn push_unique_ci(list: &mut Vec<String>, item: &str) -> bool {
    let lower = item.to_lowercase();
    if list.iter().any(|existing| existing.to_lowercase() == lower) {
        return false;
    }
    list.push(item.to_string());
    true
}
