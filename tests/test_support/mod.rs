//! Shared fixtures for the integration tests.
//!
//! Each test binary compiles this module separately, so not every helper is
//! used by every binary.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use repolens::github::test_support::InMemoryRepository;
use repolens::github::{FetchedFile, RepoId, RepositorySource, RetrievalError, TreeEntry};
use repolens::llm::test_support::ScriptedBackend;
use repolens::llm::{LlmBackend, LlmError, LlmInvocation, LlmResult, StructuredClient};
use repolens::{Config, RepositorySummarizer};

pub const REPO_URL: &str = "https://github.com/acme/demo";

/// README / requirements / app layout used by the end-to-end scenarios.
pub fn flask_repo() -> InMemoryRepository {
    InMemoryRepository::new()
        .with_file("README.md", "# Demo\n\nA tiny Flask web service.\n")
        .with_file("requirements.txt", "flask==3.0.0\nrequests==2.32.5\n")
        .with_file(
            "src/app.py",
            "from flask import Flask\nimport requests\n\napp = Flask(__name__)\n",
        )
}

pub fn client(backend: Arc<dyn LlmBackend>) -> StructuredClient {
    StructuredClient::new(backend, "test-model", Duration::from_secs(5))
        .with_retry_delay(Duration::ZERO)
}

pub fn summarizer(
    source: Arc<dyn RepositorySource>,
    backend: Arc<dyn LlmBackend>,
    config: Config,
) -> RepositorySummarizer {
    RepositorySummarizer::new(source, client(backend), Arc::new(config))
}

/// Which generative step an invocation belongs to, by its system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Planner,
    Chunk,
    Final,
    Judge,
}

pub fn step_of(inv: &LlmInvocation) -> Step {
    let system = inv.system_text();
    if system == repolens::selectors::PLANNER_SYSTEM_PROMPT {
        Step::Planner
    } else if system == repolens::packet::CHUNK_SYSTEM_PROMPT {
        Step::Chunk
    } else if system == repolens::engine::FINAL_SYSTEM_PROMPT {
        Step::Final
    } else {
        Step::Judge
    }
}

/// Backend answering each step from a closure over `(step, invocation)`.
pub fn routed<F>(handler: F) -> Arc<ScriptedBackend>
where
    F: Fn(Step, &LlmInvocation) -> Result<String, LlmError> + Send + Sync + 'static,
{
    Arc::new(ScriptedBackend::new(move |inv| handler(step_of(inv), inv)))
}

/// Chunk number parsed from a chunk prompt's `Chunk {n} of {count}` line.
pub fn chunk_number(inv: &LlmInvocation) -> usize {
    inv.user_text()
        .lines()
        .find_map(|line| line.strip_prefix("Chunk "))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// Tracks the highest number of overlapping calls.
#[derive(Debug, Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    pub fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Backend that sleeps per call and records peak concurrency.
///
/// The sleep cycles through one to five times `delay` by call number, so
/// concurrent calls complete out of submission order.
pub struct SlowBackend<F> {
    pub in_flight: InFlight,
    pub delay: Duration,
    calls: AtomicUsize,
    handler: F,
}

impl<F> SlowBackend<F>
where
    F: Fn(&LlmInvocation) -> Result<String, LlmError> + Send + Sync,
{
    pub fn new(delay: Duration, handler: F) -> Self {
        Self {
            in_flight: InFlight::default(),
            delay,
            calls: AtomicUsize::new(0),
            handler,
        }
    }
}

#[async_trait]
impl<F> LlmBackend for SlowBackend<F>
where
    F: Fn(&LlmInvocation) -> Result<String, LlmError> + Send + Sync,
{
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.in_flight.enter();
        tokio::time::sleep(self.delay * (call % 5 + 1) as u32).await;
        let answer = (self.handler)(&inv);
        self.in_flight.exit();
        answer.map(|text| LlmResult::new(text, "slow", inv.model))
    }
}

/// Repository wrapper that records peak concurrent content fetches.
pub struct ProbedRepository {
    pub inner: InMemoryRepository,
    pub in_flight: InFlight,
    pub delay: Duration,
}

impl ProbedRepository {
    pub fn new(inner: InMemoryRepository, delay: Duration) -> Self {
        Self {
            inner,
            in_flight: InFlight::default(),
            delay,
        }
    }
}

#[async_trait]
impl RepositorySource for ProbedRepository {
    async fn default_ref(&self, repo: &RepoId) -> Result<String, RetrievalError> {
        self.inner.default_ref(repo).await
    }

    async fn list_tree(
        &self,
        repo: &RepoId,
        git_ref: &str,
    ) -> Result<Vec<TreeEntry>, RetrievalError> {
        self.inner.list_tree(repo, git_ref).await
    }

    async fn fetch_file(&self, repo: &RepoId, git_ref: &str, entry: &TreeEntry) -> FetchedFile {
        self.in_flight.enter();
        tokio::time::sleep(self.delay).await;
        let file = self.inner.fetch_file(repo, git_ref, entry).await;
        self.in_flight.exit();
        file
    }
}
