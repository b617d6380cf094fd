//! Pipeline orchestration for repolens
//!
//! [`RepositorySummarizer`] wires the collaborators together: tree listing
//! and prefiltering, file selection, bounded retrieval, representation
//! building, evidence extraction, context budgeting, the final generation
//! call, and deterministic grounding. In evaluation mode a [`Judge`] grades
//! the result afterwards without affecting it.

mod judge;
mod pipeline;
mod prompts;

pub use judge::{EvaluationReport, JUDGE_MAX_TOKENS, Judge};
pub use pipeline::{RepositorySummarizer, SummaryRun};
pub use prompts::{
    FINAL_SYSTEM_PROMPT, JUDGE_SYSTEM_PROMPT, judge_user_prompt, render_final_user_prompt,
};
pub use repolens_evidence::{GroundingReport, SummaryResponse};
