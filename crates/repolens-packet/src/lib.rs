//! Context assembly for repolens
//!
//! Turns fetched files into prompt representations and fits them under the
//! final request's token ceiling:
//!
//! - [`chunk_text_by_lines`] and [`ChunkSummarizer`] replace oversized files
//!   with a merged digest built from concurrent per-chunk calls
//! - [`RepresentationBuilder`] picks raw text or a digest for each file
//! - [`ContextBudget`] evicts the lowest-priority blocks until the request fits

mod budget;
mod chunking;
mod model;
mod prepare;
mod render;
mod summarizer;

pub use budget::{ContextBudget, FittedBundle, MIN_REMAINING_BLOCKS, eviction_priority};
pub use chunking::{BULLET_PREFIX, chunk_text_by_lines, merge_chunk_bullets};
pub use model::{BundleBlock, FileRepresentation, RepresentationSource};
pub use prepare::RepresentationBuilder;
pub use render::{BLOCK_SEPARATOR, build_bundle, evidence_blob, join_blocks, render_block};
pub use summarizer::{CHUNK_SYSTEM_PROMPT, ChunkSummarizer, chunk_user_prompt};
