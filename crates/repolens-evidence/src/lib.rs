//! Deterministic evidence for repolens
//!
//! Two halves, neither of which calls a model:
//!
//! - **Extraction**: [`extract_signals`] parses manifest files and maps tree
//!   extensions to languages, producing [`TechnologySignals`].
//! - **Grounding**: [`validate_final_output`] checks a model draft against
//!   those signals, the evidence blob and the repository tree, then shapes it
//!   into a [`SummaryResponse`] with a confidence score.

mod languages;
mod manifests;
mod normalize;
mod signals;
mod structure;
mod technologies;
mod validator;

pub use languages::{infer_languages, language_for_extension};
pub use manifests::{ManifestFindings, ManifestKind, parse_manifest};
pub use normalize::{clean_technology, normalize_name, requirement_name};
pub use signals::{MAX_CANDIDATES, MAX_LANGUAGES, MAX_SIGNALS, TechnologySignals, extract_signals};
pub use structure::{
    BulletOutcome, COMMON_FILE_EXTENSIONS, GENERALIZED_MARKER, GENERIC_FALLBACK_BULLET,
    GENERIC_STRUCTURE_TERMS, StructureGrounding, TreeIndex, ground_bullet, ground_structure,
    has_generic_vocabulary,
};
pub use technologies::{
    MAX_EXTRA_EVIDENCED, MAX_TECHNOLOGIES, MIN_TECHNOLOGIES, PLACEHOLDER_TECHNOLOGIES,
    SAFE_TECH_WHITELIST, TechnologyGrounding, ground_technologies,
};
pub use validator::{
    EMPTY_SUMMARY, EvidenceContext, GroundingReport, MAX_STRUCTURE, MAX_SUMMARY_WORDS,
    MIN_STRUCTURE, SummaryResponse, confidence_score, validate_final_output,
};
