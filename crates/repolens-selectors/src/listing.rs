use repolens_github::TreeEntry;
use repolens_utils::paths::depth;
use repolens_utils::tokens::estimate_tokens;

/// Render `path - size` lines ordered by depth then path, stopping before the
/// first line that would exceed `budget_tokens`.
///
/// Entries left out of the listing remain eligible for selection.
#[must_use]
pub fn build_planner_listing(entries: &[TreeEntry], budget_tokens: usize) -> String {
    let mut ordered: Vec<&TreeEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| {
        depth(&a.path)
            .cmp(&depth(&b.path))
            .then_with(|| a.path.cmp(&b.path))
    });

    let mut listing = String::new();
    let mut used = 0;
    for entry in ordered {
        let line = format!("{} - {}\n", entry.path, entry.size);
        let cost = estimate_tokens(&line);
        if used + cost > budget_tokens {
            break;
        }
        used += cost;
        listing.push_str(&line);
    }
    listing
}
