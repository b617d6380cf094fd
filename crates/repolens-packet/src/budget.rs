//! Global token ceiling for the final generation request.
//!
//! The enforcer renders the whole candidate set, estimates the request size
//! (system prompt, rendered user prompt, reserved output, safety margin) and
//! evicts one block at a time until the estimate fits.
//!
//! # Eviction Order
//!
//! The block with the highest `(priority, depth, selection index)` goes first:
//!
//! | Priority | Paths |
//! |----------|-------|
//! | 3 | tests, specs, lockfiles |
//! | 2 | outside `src/`, `app/`, `lib/` |
//! | 1 | under `src/`, `app/`, `lib/` |
//!
//! Among equal priority deeper paths go before shallower ones, and among
//! exact ties the block selected last goes first.

use repolens_config::Config;
use repolens_utils::RepolensError;
use repolens_utils::paths::{depth, is_deprioritized, under_source_root};
use repolens_utils::tokens::estimate_tokens;
use tracing::{debug, info};

use crate::model::BundleBlock;
use crate::render::join_blocks;

/// Fewest blocks the enforcer will accept after evicting.
pub const MIN_REMAINING_BLOCKS: usize = 2;

/// Eviction priority of a path; higher is evicted first.
#[must_use]
pub fn eviction_priority(path: &str) -> u8 {
    if is_deprioritized(path) {
        3
    } else if under_source_root(path) {
        1
    } else {
        2
    }
}

/// A prompt body that fits the ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FittedBundle {
    /// Joined blocks that survived
    pub body: String,
    /// Fully rendered user prompt built from `body`
    pub user_prompt: String,
    /// Paths kept, in selection order
    pub kept: Vec<String>,
    /// Paths evicted, in eviction order
    pub evicted: Vec<String>,
    /// Estimate for the accepted request
    pub estimated_tokens: usize,
}

/// Fits rendered blocks under the safe context ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBudget {
    limit: usize,
    system_tokens: usize,
    output_allowance: usize,
    safety_margin: usize,
}

impl ContextBudget {
    #[must_use]
    pub fn new(
        limit: usize,
        system_prompt: &str,
        output_allowance: usize,
        safety_margin: usize,
    ) -> Self {
        Self {
            limit,
            system_tokens: estimate_tokens(system_prompt),
            output_allowance,
            safety_margin,
        }
    }

    /// Budget for the final request described by `config`.
    #[must_use]
    pub fn from_config(config: &Config, system_prompt: &str) -> Self {
        Self::new(
            config.limits.safe_context_tokens,
            system_prompt,
            config.llm.max_output_tokens_final as usize,
            config.limits.safety_margin_tokens,
        )
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Estimated request size for a rendered user prompt.
    #[must_use]
    pub fn estimate(&self, user_prompt: &str) -> usize {
        self.system_tokens
            + estimate_tokens(user_prompt)
            + self.output_allowance
            + self.safety_margin
    }

    /// Evict blocks until the request built by `render` fits.
    ///
    /// `render` turns a joined body into the full user prompt. Blocks must be
    /// in selection order.
    ///
    /// # Errors
    ///
    /// Returns [`RepolensError::ContentTooLarge`] when `blocks` is empty, or
    /// when an eviction leaves fewer than [`MIN_REMAINING_BLOCKS`].
    pub fn fit<F>(
        &self,
        blocks: Vec<BundleBlock>,
        render: F,
    ) -> Result<FittedBundle, RepolensError>
    where
        F: Fn(&str) -> String,
    {
        let candidate_count = blocks.len();
        if blocks.is_empty() {
            return Err(RepolensError::ContentTooLarge {
                reason: "no content available for final summarization".to_string(),
                candidate_count,
                remaining: 0,
                estimated_tokens: None,
                limit: self.limit,
            });
        }

        let mut working = blocks;
        let mut evicted = Vec::new();
        loop {
            let body = join_blocks(&working);
            let user_prompt = render(&body);
            let estimated = self.estimate(&user_prompt);
            if estimated <= self.limit {
                if !evicted.is_empty() {
                    info!(
                        evicted = evicted.len(),
                        remaining = working.len(),
                        estimated_tokens = estimated,
                        limit = self.limit,
                        "Context fitted after eviction"
                    );
                }
                return Ok(FittedBundle {
                    body,
                    user_prompt,
                    kept: working.into_iter().map(|b| b.path).collect(),
                    evicted,
                    estimated_tokens: estimated,
                });
            }

            let Some(victim) = worst_block(&working) else {
                break;
            };
            let removed = working.remove(victim);
            debug!(
                path = %removed.path,
                estimated_tokens = estimated,
                limit = self.limit,
                "Evicted block over context budget"
            );
            evicted.push(removed.path);

            if working.len() < MIN_REMAINING_BLOCKS {
                return Err(RepolensError::ContentTooLarge {
                    reason: "too little content would remain after eviction".to_string(),
                    candidate_count,
                    remaining: working.len(),
                    estimated_tokens: Some(estimated),
                    limit: self.limit,
                });
            }
        }

        Err(RepolensError::Internal(
            "context budget loop ended without a decision".to_string(),
        ))
    }
}

fn worst_block(blocks: &[BundleBlock]) -> Option<usize> {
    blocks
        .iter()
        .enumerate()
        .max_by_key(|(index, block)| {
            (
                eviction_priority(&block.path),
                depth(&block.path),
                *index,
            )
        })
        .map(|(index, _)| index)
}
