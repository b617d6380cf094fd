//! End-to-end summarization run.

use std::sync::Arc;
use std::time::Instant;

use repolens_config::{Config, Environment};
use repolens_evidence::{
    EvidenceContext, GroundingReport, SummaryResponse, TreeIndex, extract_signals,
    validate_final_output,
};
use repolens_github::{
    FetchLimits, GitHubClient, RepoId, RepositorySource, fetch_selected, parse_repo_url,
    prefilter_tree,
};
use repolens_llm::{FinalDraft, StructuredClient, backend_from_config};
use repolens_packet::{
    ChunkSummarizer, ContextBudget, RepresentationBuilder, build_bundle, evidence_blob,
};
use repolens_selectors::{FileSelector, SelectionStrategy};
use repolens_utils::RepolensError;
use repolens_utils::logging::{log_stage_complete, pipeline_span};
use tracing::{Instrument, info};

use crate::judge::{EvaluationReport, Judge};
use crate::prompts::{FINAL_SYSTEM_PROMPT, render_final_user_prompt};

/// Everything one successful run produced.
#[derive(Debug, Clone)]
pub struct SummaryRun {
    pub repo: RepoId,
    pub git_ref: String,
    pub strategy: SelectionStrategy,
    /// Paths chosen by the selector, in selection order
    pub selected: Vec<String>,
    /// Paths removed to fit the context ceiling
    pub evicted: Vec<String>,
    /// Paths whose content was replaced by a chunk digest
    pub chunk_summarized: Vec<String>,
    pub grounding: GroundingReport,
    /// Present in evaluation mode only
    pub evaluation: Option<EvaluationReport>,
}

impl SummaryRun {
    /// The caller-facing three-key result.
    #[must_use]
    pub fn response(&self) -> &SummaryResponse {
        &self.grounding.output
    }
}

/// Drives a repository through selection, retrieval, compression, budgeting,
/// generation and grounding.
pub struct RepositorySummarizer {
    source: Arc<dyn RepositorySource>,
    client: StructuredClient,
    config: Arc<Config>,
}

impl std::fmt::Debug for RepositorySummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositorySummarizer")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl RepositorySummarizer {
    #[must_use]
    pub fn new(
        source: Arc<dyn RepositorySource>,
        client: StructuredClient,
        config: Arc<Config>,
    ) -> Self {
        Self {
            source,
            client,
            config,
        }
    }

    /// Summarizer backed by the GitHub REST API and the configured model endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP clients cannot be built or the model
    /// API key is missing.
    pub fn from_config(config: Arc<Config>) -> Result<Self, RepolensError> {
        let source = Arc::new(GitHubClient::from_config(&config)?);
        let backend = backend_from_config(&config)?;
        let client = StructuredClient::from_config(backend, &config);
        Ok(Self::new(source, client, config))
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Summarize the repository at `url`.
    ///
    /// # Errors
    ///
    /// - `Retrieval` for an invalid URL or a failed metadata/tree request
    /// - `NoEligibleFiles` when filtering leaves nothing
    /// - `NoRetrievableContent` when no selected file yields content
    /// - `ContentTooLarge` when the context cannot be fitted
    /// - `Llm` when the final generation call fails
    /// - `InvalidOutput` when the draft cannot be shaped into a valid result
    pub async fn summarize(&self, url: &str) -> Result<SummaryRun, RepolensError> {
        let repo = parse_repo_url(url)?;
        let span = pipeline_span(&repo.to_string());
        self.run(url, repo).instrument(span).await
    }

    async fn run(&self, url: &str, repo: RepoId) -> Result<SummaryRun, RepolensError> {
        let config = &*self.config;

        let started = Instant::now();
        let git_ref = self.source.default_ref(&repo).await?;
        let tree = self.source.list_tree(&repo, &git_ref).await?;
        let filtered = prefilter_tree(&tree);
        log_stage_complete("tree", started.elapsed().as_millis());
        info!(
            git_ref = %git_ref,
            total = tree.len(),
            eligible = filtered.len(),
            "Listed repository tree"
        );
        if filtered.is_empty() {
            return Err(RepolensError::NoEligibleFiles);
        }

        let started = Instant::now();
        let selection = FileSelector::new(self.client.clone(), config)
            .select(&filtered)
            .await;
        log_stage_complete("select", started.elapsed().as_millis());

        let started = Instant::now();
        let fetched = fetch_selected(
            self.source.as_ref(),
            &repo,
            &git_ref,
            &selection.paths,
            &filtered,
            FetchLimits::from_config(config),
        )
        .await;
        log_stage_complete("fetch", started.elapsed().as_millis());
        if fetched.iter().all(|file| file.usable_content().is_none()) {
            return Err(RepolensError::NoRetrievableContent {
                selected_paths: selection.paths,
            });
        }

        let started = Instant::now();
        let summarizer = ChunkSummarizer::new(self.client.clone(), config);
        let prepared = RepresentationBuilder::new(summarizer, config)
            .prepare(&fetched)
            .await;
        log_stage_complete("prepare", started.elapsed().as_millis());
        let chunk_summarized: Vec<String> = prepared
            .iter()
            .filter(|p| p.is_chunk_summary())
            .map(|p| p.path.clone())
            .collect();

        let filtered_paths: Vec<&str> = filtered.iter().map(|e| e.path.as_str()).collect();
        let signals = extract_signals(
            fetched
                .iter()
                .filter_map(|f| f.usable_content().map(|c| (f.path.as_str(), c))),
            &filtered_paths,
        );
        let blob = evidence_blob(&prepared);

        let started = Instant::now();
        let budget = ContextBudget::from_config(config, FINAL_SYSTEM_PROMPT);
        let fitted = budget.fit(build_bundle(&prepared), |body| {
            render_final_user_prompt(&signals, body)
        })?;
        log_stage_complete("budget", started.elapsed().as_millis());

        let started = Instant::now();
        let draft = self
            .client
            .call::<FinalDraft>(
                FINAL_SYSTEM_PROMPT,
                &fitted.user_prompt,
                config.llm.max_output_tokens_final,
            )
            .await?;
        log_stage_complete("generate", started.elapsed().as_millis());

        let tree_paths: Vec<&str> = tree.iter().map(|e| e.path.as_str()).collect();
        let index = TreeIndex::new(&tree_paths);
        let prepared_paths: Vec<String> = prepared.iter().map(|p| p.path.clone()).collect();
        let grounding = validate_final_output(
            &draft.value,
            &EvidenceContext {
                signals: &signals,
                evidence_blob: &blob,
                tree: &index,
                prepared_paths: &prepared_paths,
            },
        )?;

        let evaluation = if config.mode.environment == Environment::Eval {
            let judge = if config.judge_enabled() {
                Judge::new(&self.client, &config.mode.eval_model)
                    .grade(url, &grounding.output)
                    .await
            } else {
                None
            };
            Some(EvaluationReport {
                confidence: grounding.confidence,
                judge,
            })
        } else {
            None
        };

        info!(
            strategy = %selection.strategy,
            kept = fitted.kept.len(),
            evicted = fitted.evicted.len(),
            chunk_summarized = chunk_summarized.len(),
            confidence = grounding.confidence,
            "Summary complete"
        );

        Ok(SummaryRun {
            repo,
            git_ref,
            strategy: selection.strategy,
            selected: selection.paths,
            evicted: fitted.evicted,
            chunk_summarized,
            grounding,
            evaluation,
        })
    }
}
