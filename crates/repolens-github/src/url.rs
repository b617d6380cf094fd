use once_cell::sync::Lazy;
use regex::Regex;

use crate::RetrievalError;
use crate::types::RepoId;

static GITHUB_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://github\.com/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?/?$")
        .unwrap()
});

/// Parse `http(s)://github.com/{owner}/{repo}`, tolerating a `.git` suffix and
/// a trailing slash.
///
/// # Errors
///
/// Returns `RetrievalError::InvalidUrl` for anything else.
pub fn parse_repo_url(url: &str) -> Result<RepoId, RetrievalError> {
    let trimmed = url.trim();
    GITHUB_URL
        .captures(trimmed)
        .and_then(|caps| Some(RepoId::new(caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .ok_or_else(|| RetrievalError::InvalidUrl {
            url: url.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_forms() {
        for url in [
            "https://github.com/psf/requests",
            "https://github.com/psf/requests/",
            "https://github.com/psf/requests.git",
            "http://github.com/psf/requests",
            "  https://github.com/psf/requests  ",
        ] {
            let id = parse_repo_url(url).unwrap();
            assert_eq!(id, RepoId::new("psf", "requests"), "{url}");
        }
    }

    #[test]
    fn test_keeps_dots_in_names() {
        let id = parse_repo_url("https://github.com/vercel/next.js").unwrap();
        assert_eq!(id.name, "next.js");
    }

    #[test]
    fn test_rejects_other_shapes() {
        for url in [
            "",
            "github.com/psf/requests",
            "https://gitlab.com/psf/requests",
            "https://github.com/psf",
            "https://github.com/psf/requests/tree/main",
            "https://github.com/psf/re quests",
        ] {
            let err = parse_repo_url(url).unwrap_err();
            assert!(matches!(err, RetrievalError::InvalidUrl { .. }), "{url}");
        }
    }
}
