//! Technology grounding.
//!
//! A claim survives when its normalized name is declared by a manifest,
//! inferred from extensions, or on [`SAFE_TECH_WHITELIST`]. Otherwise it may
//! survive as an extra-evidenced claim if its cleaned, lower-cased form occurs
//! in the lower-cased evidence blob, at most [`MAX_EXTRA_EVIDENCED`] times
//! per run.

use std::collections::HashSet;

use repolens_utils::lists::{clamp_list, push_unique_ci};
use tracing::debug;

use crate::normalize::{clean_technology, normalize_name};
use crate::signals::TechnologySignals;

pub const SAFE_TECH_WHITELIST: &[&str] = &[
    "python",
    "javascript",
    "java",
    "go",
    "docker",
    "rest",
    "api",
];

pub const MAX_EXTRA_EVIDENCED: usize = 2;
pub const MIN_TECHNOLOGIES: usize = 5;
pub const MAX_TECHNOLOGIES: usize = 12;

/// Last-resort fillers so sparse repositories still meet the minimum.
pub const PLACEHOLDER_TECHNOLOGIES: &[&str] = &[
    "GitHub",
    "Documentation",
    "Configuration",
    "Source Code",
    "Version Control",
];

/// Outcome of grounding the model's technology claims.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TechnologyGrounding {
    /// Non-empty cleaned claims, in model order
    pub claimed: Vec<String>,
    /// Claims that survived grounding, before any backfill
    pub validated: Vec<String>,
    /// Final list: validated, then backfill, capped at [`MAX_TECHNOLOGIES`]
    pub technologies: Vec<String>,
    /// Claims removed for lack of evidence
    pub dropped: Vec<String>,
    /// How many claims were admitted from the evidence blob alone
    pub extra_evidenced: usize,
}

/// Ground `claims` against `signals` and `evidence_blob`.
#[must_use]
pub fn ground_technologies(
    claims: &[String],
    signals: &TechnologySignals,
    evidence_blob: &str,
) -> TechnologyGrounding {
    let evidence = evidence_blob.to_lowercase();
    let mut grounding = TechnologyGrounding::default();
    let mut seen = HashSet::new();

    for claim in claims {
        let cleaned = clean_technology(claim);
        if cleaned.is_empty() {
            continue;
        }
        grounding.claimed.push(cleaned.clone());

        let key = normalize_name(&cleaned);
        if key.is_empty() || seen.contains(&key) {
            continue;
        }

        let declared = signals.declares(&key) || SAFE_TECH_WHITELIST.contains(&key.as_str());
        if declared {
            seen.insert(key);
            grounding.validated.push(cleaned);
        } else if grounding.extra_evidenced < MAX_EXTRA_EVIDENCED
            && evidence.contains(&cleaned.to_lowercase())
        {
            debug!(technology = %cleaned, "Admitting technology found only in file text");
            seen.insert(key);
            grounding.extra_evidenced += 1;
            grounding.validated.push(cleaned);
        } else {
            grounding.dropped.push(cleaned);
        }
    }

    grounding.technologies = backfill(&grounding.validated, signals);
    grounding
}

fn backfill(validated: &[String], signals: &TechnologySignals) -> Vec<String> {
    let mut technologies = clamp_list(validated, MAX_TECHNOLOGIES);
    if technologies.len() < MIN_TECHNOLOGIES {
        for item in signals.candidate_pool() {
            if technologies.len() >= MIN_TECHNOLOGIES {
                break;
            }
            let key = normalize_name(&item);
            let already = technologies.iter().any(|t| normalize_name(t) == key);
            if !already {
                push_unique_ci(&mut technologies, &item);
            }
        }
    }
    for placeholder in PLACEHOLDER_TECHNOLOGIES {
        if technologies.len() >= MIN_TECHNOLOGIES {
            break;
        }
        push_unique_ci(&mut technologies, placeholder);
    }
    technologies.truncate(MAX_TECHNOLOGIES);
    technologies
}
