//! Typed outputs for every generative step.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::schema::{FieldType, Schema, StructuredOutput};

/// Render a JSON value as trimmed text; `null` becomes `""`.
#[must_use]
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn texts(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .map(value_to_text)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Planner answer: candidate paths, unsanitized.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerOutput {
    pub important_files: Vec<Value>,
}

impl PlannerOutput {
    /// String entries only, in model order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.important_files
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }
}

impl StructuredOutput for PlannerOutput {
    fn schema() -> Schema {
        Schema::new(&[("important_files", FieldType::List)])
    }
}

/// Digest of one chunk of an oversized file.
///
/// A non-list `chunk_summary` is tolerated and yields no bullets.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkDigest {
    pub chunk_summary: Value,
}

impl ChunkDigest {
    #[must_use]
    pub fn bullets(&self) -> Vec<String> {
        match &self.chunk_summary {
            Value::Array(items) => texts(items),
            _ => Vec::new(),
        }
    }
}

impl StructuredOutput for ChunkDigest {
    fn schema() -> Schema {
        Schema::new(&[("chunk_summary", FieldType::Any)])
    }
}

/// Draft summary before grounding.
#[derive(Debug, Clone, Deserialize)]
pub struct FinalDraft {
    pub summary: String,
    pub technologies: Vec<Value>,
    pub structure: Vec<Value>,
}

impl FinalDraft {
    #[must_use]
    pub fn technology_claims(&self) -> Vec<String> {
        texts(&self.technologies)
    }

    #[must_use]
    pub fn structure_claims(&self) -> Vec<String> {
        texts(&self.structure)
    }
}

impl StructuredOutput for FinalDraft {
    fn schema() -> Schema {
        Schema::new(&[
            ("summary", FieldType::String),
            ("technologies", FieldType::List),
            ("structure", FieldType::List),
        ])
    }
}

/// Evaluation-mode grade of a finished summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub overall: f64,
    pub hallucination_flags: Vec<String>,
    pub scores: BTreeMap<String, Value>,
    pub notes: Value,
}

impl JudgeVerdict {
    /// Clamp `overall` into `[0, 1]`, drop blank flags, render notes as text.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            overall: self.overall.clamp(0.0, 1.0),
            hallucination_flags: self
                .hallucination_flags
                .into_iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
            scores: self.scores,
            notes: Value::String(value_to_text(&self.notes)),
        }
    }
}

impl StructuredOutput for JudgeVerdict {
    fn schema() -> Schema {
        Schema::new(&[
            ("overall", FieldType::Number),
            ("hallucination_flags", FieldType::List),
            ("scores", FieldType::Object),
            ("notes", FieldType::Any),
        ])
    }
}
