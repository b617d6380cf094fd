//! Final output shaping and grounding.

use std::collections::BTreeMap;

use repolens_llm::FinalDraft;
use repolens_utils::RepolensError;
use repolens_utils::lists::clamp_list;
use repolens_utils::tokens::{collapse_whitespace, truncate_words};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::signals::TechnologySignals;
use crate::structure::{TreeIndex, ground_structure};
use crate::technologies::ground_technologies;

pub const MAX_SUMMARY_WORDS: usize = 120;
pub const MIN_STRUCTURE: usize = 5;
pub const MAX_STRUCTURE: usize = 15;
pub const EMPTY_SUMMARY: &str = "Repository summary unavailable.";

/// Prepared files used to backfill a short structure list.
const STRUCTURE_BACKFILL_FILES: usize = 8;

/// Caller-facing result: exactly `summary`, `technologies` and `structure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryResponse {
    pub summary: String,
    pub technologies: Vec<String>,
    pub structure: Vec<String>,
}

/// Grounded output plus diagnostics about what grounding changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundingReport {
    pub output: SummaryResponse,
    /// Share of claims that survived grounding, in `[0, 1]`
    pub confidence: f64,
    pub dropped_technologies: Vec<String>,
    pub extra_evidenced: usize,
    /// Original text of structure bullets whose paths were stripped
    pub generalized_structure: Vec<String>,
    pub dropped_structure: Vec<String>,
}

/// Everything grounding checks the draft against.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceContext<'a> {
    pub signals: &'a TechnologySignals,
    /// Concatenated prepared file texts
    pub evidence_blob: &'a str,
    /// Full repository tree
    pub tree: &'a TreeIndex,
    /// Prepared file paths in selection order
    pub prepared_paths: &'a [String],
}

/// Average of the technology and structure survival ratios.
///
/// A ratio whose claimed count is zero counts as `1.0`. The result is
/// rounded to four decimals and clamped to `[0, 1]`.
#[must_use]
pub fn confidence_score(
    validated_tech: usize,
    claimed_tech: usize,
    grounded_structure: usize,
    claimed_structure: usize,
) -> f64 {
    fn ratio(kept: usize, claimed: usize) -> f64 {
        if claimed == 0 {
            1.0
        } else {
            kept as f64 / claimed as f64
        }
    }
    let score = (ratio(validated_tech, claimed_tech)
        + ratio(grounded_structure, claimed_structure))
        / 2.0;
    ((score * 10_000.0).round() / 10_000.0).clamp(0.0, 1.0)
}

/// Shape and ground the model's draft into the caller-facing result.
///
/// # Errors
///
/// Returns [`RepolensError::InvalidOutput`] when fewer than
/// [`MIN_STRUCTURE`] structure bullets remain even after backfilling from
/// the prepared files.
pub fn validate_final_output(
    draft: &FinalDraft,
    ctx: &EvidenceContext<'_>,
) -> Result<GroundingReport, RepolensError> {
    let summary = collapse_whitespace(&draft.summary);
    let summary = if summary.is_empty() {
        EMPTY_SUMMARY.to_string()
    } else {
        truncate_words(&summary, MAX_SUMMARY_WORDS)
    };

    let tech = ground_technologies(&draft.technology_claims(), ctx.signals, ctx.evidence_blob);
    let structure = ground_structure(&draft.structure_claims(), ctx.tree);

    let mut bullets = clamp_list(&structure.grounded, MAX_STRUCTURE);
    if bullets.len() < MIN_STRUCTURE {
        let backfill = ctx
            .prepared_paths
            .iter()
            .take(STRUCTURE_BACKFILL_FILES)
            .map(|path| format!("{path}: included from selected context."));
        bullets = clamp_list(bullets.into_iter().chain(backfill), MAX_STRUCTURE);
    }
    if bullets.len() < MIN_STRUCTURE {
        let mut details = BTreeMap::new();
        details.insert("structure_count".to_string(), json!(bullets.len()));
        details.insert("prepared_files".to_string(), json!(ctx.prepared_paths.len()));
        return Err(RepolensError::InvalidOutput {
            reason: "could not build a valid structure list".to_string(),
            details,
        });
    }

    let confidence = confidence_score(
        tech.validated.len(),
        tech.claimed.len(),
        structure.grounded.len(),
        structure.claimed.len(),
    );
    info!(
        confidence,
        technologies = tech.technologies.len(),
        dropped_technologies = tech.dropped.len(),
        generalized_structure = structure.generalized.len(),
        dropped_structure = structure.dropped.len(),
        "Grounded final output"
    );

    Ok(GroundingReport {
        output: SummaryResponse {
            summary,
            technologies: tech.technologies,
            structure: bullets,
        },
        confidence,
        dropped_technologies: tech.dropped,
        extra_evidenced: tech.extra_evidenced,
        generalized_structure: structure.generalized,
        dropped_structure: structure.dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::extract_signals;
    use repolens_utils::ErrorKind;
    use serde_json::Value;

    fn draft(value: Value) -> FinalDraft {
        serde_json::from_value(value).unwrap()
    }

    struct Fixture {
        signals: TechnologySignals,
        tree: TreeIndex,
        prepared: Vec<String>,
        blob: String,
    }

    impl Fixture {
        fn flask_app() -> Self {
            let paths = ["README.md", "requirements.txt", "src/app.py"];
            Self {
                signals: extract_signals(
                    [("requirements.txt", "flask==3.0.0\nrequests==2.32.5\n")],
                    &paths,
                ),
                tree: TreeIndex::new(&paths),
                prepared: paths.iter().map(|p| (*p).to_string()).collect(),
                blob: "# Demo\nflask==3.0.0\nrequests==2.32.5\nimport flask\n".to_string(),
            }
        }

        fn ctx(&self) -> EvidenceContext<'_> {
            EvidenceContext {
                signals: &self.signals,
                evidence_blob: &self.blob,
                tree: &self.tree,
                prepared_paths: &self.prepared,
            }
        }
    }

    #[test]
    fn test_confidence_score() {
        assert!((confidence_score(0, 0, 0, 0) - 1.0).abs() < f64::EPSILON);
        assert!((confidence_score(1, 2, 3, 3) - 0.75).abs() < f64::EPSILON);
        assert!((confidence_score(1, 3, 0, 0) - 0.6667).abs() < 1e-9);
        assert!((confidence_score(0, 4, 0, 5)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_grounded_output_shape() {
        let fixture = Fixture::flask_app();
        let report = validate_final_output(
            &draft(json!({
                "summary": "  A   small Flask\nservice. ",
                "technologies": ["Python", "Django", "requests"],
                "structure": [
                    "README.md: overview",
                    "requirements.txt: dependencies",
                    "src/app.py: entrypoint",
                    "src/models.py: ORM module",
                    "Flask app factory",
                    "docs/: documentation"
                ]
            })),
            &fixture.ctx(),
        )
        .unwrap();

        assert_eq!(report.output.summary, "A small Flask service.");
        let techs: Vec<String> = report
            .output
            .technologies
            .iter()
            .map(|t| t.to_lowercase())
            .collect();
        assert!(techs.contains(&"requests".to_string()));
        assert!(!techs.contains(&"django".to_string()));
        assert!((5..=12).contains(&techs.len()));
        assert_eq!(report.dropped_technologies, vec!["Django"]);

        assert_eq!(report.output.structure.len(), 6);
        assert!(!report.output.structure.iter().any(|s| s.contains("src/models.py")));
        assert_eq!(
            report.generalized_structure,
            vec!["src/models.py: ORM module", "docs/: documentation"]
        );
        assert!((report.confidence - 0.8333).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary_gets_default_and_long_summary_is_cut() {
        let fixture = Fixture::flask_app();
        let structure = json!(["README.md", "src/app.py", "a", "b", "c"]);
        let report = validate_final_output(
            &draft(json!({"summary": "   ", "technologies": [], "structure": structure})),
            &fixture.ctx(),
        )
        .unwrap();
        assert_eq!(report.output.summary, EMPTY_SUMMARY);

        let long = vec!["word"; 200].join(" ");
        let report = validate_final_output(
            &draft(json!({"summary": long, "technologies": [], "structure": structure})),
            &fixture.ctx(),
        )
        .unwrap();
        assert_eq!(report.output.summary.split_whitespace().count(), MAX_SUMMARY_WORDS);
        assert!(report.output.summary.ends_with('.'));
    }

    #[test]
    fn test_short_structure_is_backfilled_from_prepared_files() {
        let fixture = Fixture::flask_app();
        let report = validate_final_output(
            &draft(json!({
                "summary": "x",
                "technologies": ["Flask"],
                "structure": ["Flask app", "Small codebase"]
            })),
            &fixture.ctx(),
        )
        .unwrap();
        assert_eq!(
            report.output.structure,
            vec![
                "Flask app",
                "Small codebase",
                "README.md: included from selected context.",
                "requirements.txt: included from selected context.",
                "src/app.py: included from selected context.",
            ]
        );
    }

    #[test]
    fn test_structure_that_cannot_reach_minimum_is_rejected() {
        let mut fixture = Fixture::flask_app();
        fixture.prepared.truncate(1);
        let err = validate_final_output(
            &draft(json!({"summary": "x", "technologies": [], "structure": ["one"]})),
            &fixture.ctx(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedModelOutput);
    }

    #[test]
    fn test_summary_response_has_exactly_three_keys() {
        let response = SummaryResponse {
            summary: "s".into(),
            technologies: vec!["t".into()],
            structure: vec!["b".into()],
        };
        let value = serde_json::to_value(&response).unwrap();
        let mut keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["structure", "summary", "technologies"]);
        assert!(serde_json::from_value::<SummaryResponse>(json!({
            "summary": "s", "technologies": [], "structure": [], "extra": 1
        }))
        .is_err());
    }
}
