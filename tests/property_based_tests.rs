//! Property-Based Tests for repolens
//!
//! **WHITE-BOX TEST**: This test reaches into the stage crates through the
//! hidden re-exports (`repolens::selectors`, `repolens::packet`,
//! `repolens::evidence`) and may break with internal refactors.
//!
//! Invariants covered:
//! - Fallback selection stays within the limit, inside the tree, without repeats
//! - Planner path sanitization never admits unknown paths
//! - Line chunking reassembles to the original text
//! - Context fitting either fits the ceiling or fails as too large
//! - Eviction never removes a block that ranks below a kept one
//! - Technology grounding always lands between 5 and 12 entries
//! - Structure grounding never keeps an absent path
//!
//! ## Configuration
//!
//! - `PROPTEST_CASES`: Number of test cases per property (default: 64)
//! - `PROPTEST_MAX_SHRINK_ITERS`: Max shrinking iterations on failure (default: 1000)
//!
//! ```bash
//! PROPTEST_CASES=256 cargo test --test property_based_tests
//! ```

use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::env;

use repolens::RepolensError;
use repolens::evidence::{
    MAX_TECHNOLOGIES, MIN_TECHNOLOGIES, TechnologySignals, TreeIndex, confidence_score,
    ground_structure, ground_technologies,
};
use repolens::github::TreeEntry;
use repolens::packet::{BundleBlock, ContextBudget, chunk_text_by_lines, eviction_priority};
use repolens::selectors::{fallback_selection, sanitize_planner_paths};

/// Default number of test cases per property.
const DEFAULT_PROPTEST_CASES: u32 = 64;

/// Default max shrink iterations.
const DEFAULT_MAX_SHRINK_ITERS: u32 = 1000;

/// Creates a ProptestConfig that respects environment variables.
///
/// `max_cases` caps the case count for slow properties even when
/// `PROPTEST_CASES` asks for more.
fn proptest_config(max_cases: Option<u32>) -> ProptestConfig {
    let env_cases = env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(DEFAULT_PROPTEST_CASES);

    let env_shrink_iters = env::var("PROPTEST_MAX_SHRINK_ITERS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(DEFAULT_MAX_SHRINK_ITERS);

    let cases = match max_cases {
        Some(max) => env_cases.min(max),
        None => env_cases,
    };

    ProptestConfig {
        cases,
        max_shrink_iters: env_shrink_iters,
        max_shrink_time: 30000, // 30 seconds max shrink time
        ..ProptestConfig::default()
    }
}

/// Repository-shaped relative paths, including deprioritized areas.
fn arb_path() -> impl Strategy<Value = String> {
    prop_oneof![
        "(README|LICENSE|Makefile)(\\.md)?",
        "(requirements\\.txt|package\\.json|go\\.mod|Cargo\\.toml|Dockerfile)",
        "(src|app|lib)/[a-z]{1,6}\\.(py|rs|ts|go)",
        "(src|lib)/[a-z]{1,4}/[a-z]{1,6}\\.(py|rs|js)",
        "(tests|docs|examples|scripts)/[a-z]{1,6}\\.(py|md|sh)",
        "[a-z]{1,5}/[a-z]{1,5}/[a-z]{1,5}/[a-z]{1,6}\\.(py|json|yaml)",
    ]
}

fn arb_tree() -> impl Strategy<Value = Vec<TreeEntry>> {
    prop::collection::btree_set(arb_path(), 1..40).prop_map(|paths| {
        paths
            .into_iter()
            .map(|path| TreeEntry::new(path, 100))
            .collect()
    })
}

/// Distinct paths paired with block sizes in characters.
fn arb_blocks() -> impl Strategy<Value = Vec<BundleBlock>> {
    prop::collection::btree_set(arb_path(), 1..12).prop_flat_map(|paths| {
        let count = paths.len();
        (Just(paths), prop::collection::vec(40usize..2000, count))
    })
    .prop_map(|(paths, sizes)| {
        paths
            .into_iter()
            .zip(sizes)
            .map(|(path, size)| BundleBlock {
                block: format!("FILE: {path}\n{}", "x".repeat(size)),
                path,
            })
            .collect()
    })
}

fn eviction_key(path: &str) -> (u8, usize) {
    (eviction_priority(path), path.matches('/').count())
}

#[test]
fn prop_fallback_selection_is_bounded_subset() {
    let config = proptest_config(None);

    proptest!(config, |(tree in arb_tree(), limit in 1usize..20)| {
        let selected = fallback_selection(&tree, limit);
        let known: HashSet<&str> = tree.iter().map(|e| e.path.as_str()).collect();

        prop_assert!(selected.len() <= limit);
        let distinct: HashSet<&String> = selected.iter().collect();
        prop_assert_eq!(distinct.len(), selected.len());
        for path in &selected {
            prop_assert!(known.contains(path.as_str()), "unknown path {}", path);
        }
    });
}

#[test]
fn prop_fallback_selection_is_deterministic() {
    let config = proptest_config(None);

    proptest!(config, |(tree in arb_tree(), limit in 1usize..20)| {
        prop_assert_eq!(fallback_selection(&tree, limit), fallback_selection(&tree, limit));
    });
}

#[test]
fn prop_sanitized_planner_paths_stay_in_tree() {
    let config = proptest_config(None);

    proptest!(config, |(
        tree in arb_tree(),
        proposed in prop::collection::vec(arb_path(), 0..30),
        limit in 1usize..15,
    )| {
        let kept = sanitize_planner_paths(&proposed, &tree, limit);
        let known: HashSet<&str> = tree.iter().map(|e| e.path.as_str()).collect();

        prop_assert!(kept.len() <= limit);
        prop_assert!(kept.iter().all(|p| known.contains(p.as_str())));
        let distinct: HashSet<&String> = kept.iter().collect();
        prop_assert_eq!(distinct.len(), kept.len());

        // Proposal order is preserved
        let positions: Vec<usize> = kept
            .iter()
            .map(|p| proposed.iter().position(|q| q == p).unwrap_or(usize::MAX))
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    });
}

#[test]
fn prop_chunks_reassemble_original_text() {
    let config = proptest_config(None);

    proptest!(config, |(
        lines in prop::collection::vec("[a-z =_()]{0,80}", 0..200),
        target in 5usize..200,
    )| {
        let text: String = lines.iter().map(|l| format!("{l}\n")).collect();
        let chunks = chunk_text_by_lines(&text, target);

        prop_assert_eq!(chunks.concat(), text.clone());
        prop_assert!(chunks.iter().all(|c| !c.is_empty()));
        prop_assert!(chunks.iter().all(|c| c.ends_with('\n')));
        // Whole-text estimate, as the per-file ceiling counts it
        if text.chars().count() / 4 > target && lines.len() > 1 {
            prop_assert!(chunks.len() >= 2);
        }
    });
}

#[test]
fn prop_context_fit_respects_ceiling() {
    let config = proptest_config(None);

    proptest!(config, |(blocks in arb_blocks(), limit in 200usize..4000)| {
        let budget = ContextBudget::new(limit, "system prompt", 100, 20);
        let paths: Vec<String> = blocks.iter().map(|b| b.path.clone()).collect();

        match budget.fit(blocks, |body| format!("Files:\n{body}")) {
            Ok(fitted) => {
                prop_assert!(fitted.estimated_tokens <= limit);
                prop_assert!(fitted.kept.len() + fitted.evicted.len() == paths.len());

                // Kept blocks keep their selection order
                let order: Vec<&String> =
                    paths.iter().filter(|p| fitted.kept.contains(p)).collect();
                prop_assert_eq!(order, fitted.kept.iter().collect::<Vec<_>>());

                for evicted in &fitted.evicted {
                    for kept in &fitted.kept {
                        prop_assert!(
                            eviction_key(evicted) >= eviction_key(kept),
                            "evicted {} ranks below kept {}",
                            evicted,
                            kept
                        );
                    }
                }
            }
            Err(RepolensError::ContentTooLarge { candidate_count, remaining, .. }) => {
                prop_assert_eq!(candidate_count, paths.len());
                prop_assert!(remaining < 2);
            }
            Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
        }
    });
}

#[test]
fn prop_technologies_land_within_bounds() {
    let config = proptest_config(None);

    proptest!(config, |(
        claims in prop::collection::vec("[A-Za-z][A-Za-z0-9 .+-]{0,15}", 0..25),
        candidates in prop::collection::vec("[a-z]{2,10}", 0..10),
        blob in "[a-zA-Z ]{0,200}",
    )| {
        let signals = TechnologySignals {
            languages: vec!["Python".to_string()],
            candidates,
            signals: Vec::new(),
        };
        let grounding = ground_technologies(&claims, &signals, &blob);

        prop_assert!(grounding.technologies.len() >= MIN_TECHNOLOGIES);
        prop_assert!(grounding.technologies.len() <= MAX_TECHNOLOGIES);
        prop_assert!(grounding.extra_evidenced <= 2);

        let lower: BTreeSet<String> =
            grounding.technologies.iter().map(|t| t.to_lowercase()).collect();
        prop_assert_eq!(lower.len(), grounding.technologies.len());
    });
}

#[test]
fn prop_structure_never_keeps_absent_paths() {
    let config = proptest_config(None);

    proptest!(config, |(
        present in prop::collection::btree_set("src/[a-z]{1,6}\\.py", 1..10),
        missing in prop::collection::vec("[a-z]{1,6}", 1..6),
        lead in prop_oneof![Just("Source module"), Just("Configuration for"), Just("Entry")],
    )| {
        let present: Vec<String> = present.into_iter().collect();
        let tree = TreeIndex::new(&present);
        let bullets: Vec<String> = missing
            .iter()
            .map(|name| format!("{lead} missing/{name}.py handles requests."))
            .collect();

        let grounding = ground_structure(&bullets, &tree);
        for bullet in &grounding.grounded {
            prop_assert!(!bullet.contains("missing/"), "absent path kept: {}", bullet);
        }
        prop_assert_eq!(grounding.claimed.len(), bullets.len());
        prop_assert_eq!(
            grounding.grounded.len() + grounding.dropped.len(),
            grounding.claimed.len()
        );
    });
}

#[test]
fn prop_confidence_is_a_unit_ratio() {
    let config = proptest_config(None);

    proptest!(config, |(
        claimed_tech in 0usize..30,
        claimed_structure in 0usize..30,
        tech_frac in 0.0f64..=1.0,
        structure_frac in 0.0f64..=1.0,
    )| {
        let validated = (claimed_tech as f64 * tech_frac) as usize;
        let grounded = (claimed_structure as f64 * structure_frac) as usize;
        let score = confidence_score(validated, claimed_tech, grounded, claimed_structure);

        prop_assert!((0.0..=1.0).contains(&score));
        if validated == claimed_tech && grounded == claimed_structure {
            prop_assert!((score - 1.0).abs() < 1e-9);
        }
    });
}
