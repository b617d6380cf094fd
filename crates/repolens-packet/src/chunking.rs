//! Line-aligned chunking and deterministic digest merge.

use std::collections::HashSet;

use repolens_utils::tokens::CHARS_PER_TOKEN;

/// Prefix applied to every merged digest bullet.
pub const BULLET_PREFIX: &str = "- ";

/// Split `text` into contiguous chunks of whole lines.
///
/// Lines keep their terminators, so concatenating the chunks reproduces
/// `text` exactly. A chunk is closed when it is non-empty and adding the next
/// line would push the chunk's own estimate over `target_tokens`; a single
/// line larger than the target becomes a chunk of its own. Empty text yields
/// no chunks.
///
/// The chunk is measured as a whole rather than by summing per-line
/// estimates, so any multi-line text whose estimate exceeds `target_tokens`
/// yields at least two chunks.
#[must_use]
pub fn chunk_text_by_lines(text: &str, target_tokens: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for line in text.split_inclusive('\n') {
        let line_chars = line.chars().count();
        if !current.is_empty() && estimate_chars(current_chars + line_chars) > target_tokens {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        current.push_str(line);
        current_chars += line_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Token estimate for `chars` characters, matching `estimate_tokens`.
fn estimate_chars(chars: usize) -> usize {
    if chars == 0 { 0 } else { (chars / CHARS_PER_TOKEN).max(1) }
}

/// Merge per-chunk bullet lists into one digest.
///
/// `digests` may arrive in any order; they are re-sorted by chunk index
/// before flattening. Bullets are trimmed, empty ones dropped, and
/// case-insensitive repeats keep only the first occurrence.
#[must_use]
pub fn merge_chunk_bullets(mut digests: Vec<(usize, Vec<String>)>) -> String {
    digests.sort_by_key(|(index, _)| *index);

    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for (_, bullets) in digests {
        for bullet in bullets {
            let bullet = bullet.trim();
            if bullet.is_empty() || !seen.insert(bullet.to_lowercase()) {
                continue;
            }
            merged.push(format!("{BULLET_PREFIX}{bullet}"));
        }
    }
    merged.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use repolens_utils::tokens::estimate_tokens;

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunk_text_by_lines("", 10).is_empty());
    }

    #[test]
    fn test_small_text_is_one_chunk() {
        let text = "fn main() {}\n";
        assert_eq!(chunk_text_by_lines(text, 100), vec![text.to_string()]);
    }

    #[test]
    fn test_chunks_break_on_line_boundaries() {
        // Each line is 8 chars (2 tokens); a 4-token target holds two lines.
        let text = "line-01\nline-02\nline-03\nline-04\nline-05\n";
        let chunks = chunk_text_by_lines(text, 4);
        assert_eq!(
            chunks,
            vec!["line-01\nline-02\n", "line-03\nline-04\n", "line-05\n"]
        );
    }

    #[test]
    fn test_oversized_line_is_its_own_chunk() {
        let long = "x".repeat(400);
        let text = format!("a\n{long}\nb\n");
        let chunks = chunk_text_by_lines(&text, 5);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], format!("{long}\n"));
    }

    #[test]
    fn test_short_lines_over_target_still_split() {
        // 49 chars is 12 tokens as a whole, but each 7-char line rounds down
        // to a single token.
        let text = "abcdef\n".repeat(7);
        assert_eq!(estimate_tokens(&text), 12);
        let chunks = chunk_text_by_lines(&text, 10);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| estimate_tokens(c) <= 10));
    }

    #[test]
    fn test_missing_trailing_newline_is_preserved() {
        let chunks = chunk_text_by_lines("alpha\nbeta", 1);
        assert_eq!(chunks, vec!["alpha\n", "beta"]);
    }

    #[test]
    fn test_merge_sorts_by_index_and_dedupes() {
        let digests = vec![
            (2, vec!["Exposes HTTP routes".to_string()]),
            (0, vec!["Loads config".to_string(), "  ".to_string()]),
            (1, vec!["loads CONFIG".to_string(), "Opens DB pool".to_string()]),
        ];
        assert_eq!(
            merge_chunk_bullets(digests),
            "- Loads config\n- Opens DB pool\n- Exposes HTTP routes"
        );
    }

    #[test]
    fn test_merge_of_nothing_is_empty() {
        assert_eq!(merge_chunk_bullets(Vec::new()), "");
        assert_eq!(merge_chunk_bullets(vec![(0, Vec::new())]), "");
    }

    proptest! {
        #[test]
        fn prop_chunks_reassemble_to_original(
            lines in prop::collection::vec("[a-z ]{0,60}", 0..80),
            target in 1usize..50,
        ) {
            let text = lines.join("\n");
            let chunks = chunk_text_by_lines(&text, target);
            prop_assert_eq!(chunks.concat(), text.clone());
            prop_assert!(chunks.iter().all(|c| !c.is_empty()));
            if text.split_inclusive('\n').count() > 1 && estimate_tokens(&text) > target {
                prop_assert!(chunks.len() >= 2);
            }
        }

        #[test]
        fn prop_merge_ignores_completion_order(
            bullets in prop::collection::vec(prop::collection::vec("[a-dA-D]{1,3}", 0..4), 0..12),
            seed in any::<u64>(),
        ) {
            let ordered: Vec<(usize, Vec<String>)> = bullets.into_iter().enumerate().collect();
            let mut shuffled = ordered.clone();
            let len = shuffled.len();
            if len > 1 {
                let mut s = seed;
                for i in (1..len).rev() {
                    s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                    let j = (s >> 33) as usize % (i + 1);
                    shuffled.swap(i, j);
                }
            }
            prop_assert_eq!(merge_chunk_bullets(ordered), merge_chunk_bullets(shuffled));
        }
    }
}
