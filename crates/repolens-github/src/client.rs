//! GitHub REST client
//!
//! Request policy:
//! - 429, or 403 with `X-RateLimit-Remaining: 0`: up to 3 attempts, backing
//!   off 1s then 2s
//! - timeouts: one retry after 1s
//! - 404 on metadata/tree: `NotFound`; other 4xx/5xx: `Upstream`

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use repolens_config::Config;
use repolens_utils::redaction::redact_error_message;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::RetrievalError;
use crate::source::RepositorySource;
use crate::types::{FetchedFile, RepoId, SkipReason, TreeEntry};

const RATE_LIMIT_ATTEMPTS: u32 = 3;

const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

const USER_AGENT_VALUE: &str = concat!("repolens/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: Url,
    timeout: Duration,
    backoff: Duration,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// # Errors
    ///
    /// Returns `RetrievalError::Misconfiguration` for an unusable API base, a
    /// token that is not a valid header value, or a client build failure.
    pub fn new(
        api_base: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, RetrievalError> {
        let api_base = Url::parse(api_base).map_err(|e| {
            RetrievalError::Misconfiguration(format!("invalid GitHub API base '{api_base}': {e}"))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(RetrievalError::Misconfiguration(format!(
                "GitHub API base '{api_base}' cannot carry a path"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                RetrievalError::Misconfiguration("GitHub token is not a valid header value".into())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                RetrievalError::Misconfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            api_base,
            timeout,
            backoff: DEFAULT_BACKOFF,
        })
    }

    /// Build from configuration; the token variable is optional.
    ///
    /// # Errors
    ///
    /// See [`GitHubClient::new`].
    pub fn from_config(config: &Config) -> Result<Self, RetrievalError> {
        let token = std::env::var(&config.github.token_env).ok();
        Self::new(
            &config.github.api_base,
            token.as_deref(),
            config.retrieval_timeout(),
        )
    }

    /// Base delay between retries (defaults to one second).
    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, RetrievalError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RetrievalError::Misconfiguration("GitHub API base cannot carry a path".into())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET with timeout and rate-limit retries. Status handling is left to
    /// the caller.
    async fn get(&self, url: &Url) -> Result<Response, RetrievalError> {
        let mut timeout_retried = false;
        let mut rate_limited: u32 = 0;

        loop {
            debug!(url = %url, "GitHub request");
            let response = match self.client.get(url.clone()).timeout(self.timeout).send().await {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    if timeout_retried {
                        return Err(RetrievalError::Timeout {
                            duration: self.timeout,
                        });
                    }
                    warn!(url = %url, "GitHub request timed out, retrying");
                    timeout_retried = true;
                    tokio::time::sleep(self.backoff).await;
                    continue;
                }
                Err(e) => {
                    return Err(RetrievalError::Upstream {
                        status: None,
                        message: redact_error_message(&e.to_string()),
                    });
                }
            };

            if is_rate_limited(&response) {
                rate_limited += 1;
                if rate_limited >= RATE_LIMIT_ATTEMPTS {
                    return Err(RetrievalError::RateLimited {
                        attempts: rate_limited,
                    });
                }
                let delay = self.backoff * 2u32.pow(rate_limited - 1);
                warn!(url = %url, attempt = rate_limited, ?delay, "GitHub rate limit hit, backing off");
                tokio::time::sleep(delay).await;
                continue;
            }

            return Ok(response);
        }
    }

    async fn get_json(&self, url: &Url, resource: &str) -> Result<Value, RetrievalError> {
        let response = self.get(url).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RetrievalError::NotFound {
                resource: resource.to_string(),
            });
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(RetrievalError::Upstream {
                status: Some(status.as_u16()),
                message: format!("GitHub API returned {status} for {resource}"),
            });
        }
        response.json().await.map_err(|e| RetrievalError::Upstream {
            status: Some(status.as_u16()),
            message: format!("GitHub API returned invalid JSON for {resource}: {e}"),
        })
    }
}

fn is_rate_limited(response: &Response) -> bool {
    match response.status() {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0"),
        _ => false,
    }
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<RawTreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct RawTreeEntry {
    #[serde(default)]
    path: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    encoding: Option<String>,
    content: Option<Value>,
}

/// Decode a contents-API payload into text.
fn decode_content(body: ContentResponse) -> Result<String, SkipReason> {
    match (body.encoding.as_deref(), body.content) {
        (Some("base64"), content) => {
            let encoded = content
                .as_ref()
                .and_then(Value::as_str)
                .unwrap_or_default();
            // Line breaks and other non-alphabet bytes are ignored.
            let cleaned: String = encoded
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
                .collect();
            let bytes = STANDARD
                .decode(cleaned.as_bytes())
                .map_err(|_| SkipReason::FileDecodeError)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        (_, Some(Value::String(text))) => Ok(text),
        _ => Err(SkipReason::UnsupportedContentEncoding),
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn default_ref(&self, repo: &RepoId) -> Result<String, RetrievalError> {
        let url = self.endpoint(["repos", repo.owner.as_str(), repo.name.as_str()])?;
        let metadata = self.get_json(&url, &format!("repository {repo}")).await?;
        Ok(metadata
            .get("default_branch")
            .and_then(Value::as_str)
            .filter(|branch| !branch.is_empty())
            .unwrap_or("main")
            .to_string())
    }

    async fn list_tree(
        &self,
        repo: &RepoId,
        git_ref: &str,
    ) -> Result<Vec<TreeEntry>, RetrievalError> {
        let mut url = self.endpoint([
            "repos",
            repo.owner.as_str(),
            repo.name.as_str(),
            "git",
            "trees",
            git_ref,
        ])?;
        url.query_pairs_mut().append_pair("recursive", "1");

        let value = self.get_json(&url, &format!("tree {repo}@{git_ref}")).await?;
        let body: TreeResponse =
            serde_json::from_value(value).map_err(|e| RetrievalError::Upstream {
                status: None,
                message: format!("unexpected tree payload: {e}"),
            })?;
        if body.truncated {
            warn!(repo = %repo, "GitHub truncated the recursive tree listing");
        }

        let entries: Vec<TreeEntry> = body
            .tree
            .into_iter()
            .filter(|raw| raw.kind == "blob" && !raw.path.is_empty())
            .map(|raw| TreeEntry::new(raw.path, raw.size.unwrap_or(0)))
            .collect();
        if entries.is_empty() {
            return Err(RetrievalError::EmptyRepository);
        }
        debug!(repo = %repo, entries = entries.len(), "Listed repository tree");
        Ok(entries)
    }

    async fn fetch_file(&self, repo: &RepoId, git_ref: &str, entry: &TreeEntry) -> FetchedFile {
        let skipped = |reason| FetchedFile::skipped(&entry.path, reason);

        let base = ["repos", repo.owner.as_str(), repo.name.as_str(), "contents"];
        let mut url = match self.endpoint(base.into_iter().chain(entry.path.split('/'))) {
            Ok(url) => url,
            Err(_) => return skipped(SkipReason::UpstreamError),
        };
        url.query_pairs_mut().append_pair("ref", git_ref);

        let response = match self.get(&url).await {
            Ok(response) => response,
            Err(RetrievalError::Timeout { .. }) => return skipped(SkipReason::Timeout),
            Err(RetrievalError::RateLimited { .. }) => return skipped(SkipReason::Http(429)),
            Err(_) => return skipped(SkipReason::UpstreamError),
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return skipped(SkipReason::MissingFile);
        }
        if status.is_client_error() || status.is_server_error() {
            return skipped(SkipReason::Http(status.as_u16()));
        }

        let body: ContentResponse = match response.json().await {
            Ok(body) => body,
            Err(_) => return skipped(SkipReason::InvalidJson),
        };
        match decode_content(body) {
            Ok(text) => FetchedFile::with_content(&entry.path, text),
            Err(reason) => skipped(reason),
        }
    }
}
