use serde::Serialize;

use repolens_utils::lists::clamp_list;

use crate::languages::infer_languages;
use crate::manifests::{ManifestFindings, parse_manifest};
use crate::normalize::normalize_name;

pub const MAX_CANDIDATES: usize = 200;
pub const MAX_SIGNALS: usize = 20;
pub const MAX_LANGUAGES: usize = 20;

const PRESENCE_SUFFIX: &str = " present";

/// Deterministic technology evidence for one repository.
///
/// Serves both as drafting hints for the final prompt and as the authority
/// grounding checks the model's claims against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TechnologySignals {
    /// Languages inferred from extensions across the filtered tree
    pub languages: Vec<String>,
    /// Dependency names declared in manifest files, display form
    pub candidates: Vec<String>,
    /// Tooling markers such as `"Dockerfile present"`
    pub signals: Vec<String>,
}

impl TechnologySignals {
    /// Backfill pool: languages, then candidates, then signals without their
    /// `" present"` suffix, deduplicated case-insensitively.
    #[must_use]
    pub fn candidate_pool(&self) -> Vec<String> {
        let signals = self
            .signals
            .iter()
            .map(|s| s.strip_suffix(PRESENCE_SUFFIX).unwrap_or(s));
        clamp_list(
            self.languages
                .iter()
                .map(String::as_str)
                .chain(self.candidates.iter().map(String::as_str))
                .chain(signals),
            MAX_CANDIDATES,
        )
    }

    /// Whether a normalized name is a declared dependency or inferred language.
    #[must_use]
    pub fn declares(&self, normalized: &str) -> bool {
        !normalized.is_empty()
            && self
                .languages
                .iter()
                .chain(&self.candidates)
                .any(|name| normalize_name(name) == normalized)
    }
}

/// Extract signals from fetched manifest content and every filtered tree path.
///
/// `files` yields `(path, content)` pairs; non-manifest files are ignored.
#[must_use]
pub fn extract_signals<'a, I, S>(files: I, all_paths: &[S]) -> TechnologySignals
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
    S: AsRef<str>,
{
    let mut findings = ManifestFindings::default();
    for (path, content) in files {
        parse_manifest(path, content, &mut findings);
    }

    TechnologySignals {
        languages: clamp_list(infer_languages(all_paths), MAX_LANGUAGES),
        candidates: clamp_list(findings.candidates, MAX_CANDIDATES),
        signals: clamp_list(findings.signals, MAX_SIGNALS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_signals() {
        let files = [
            ("README.md", "# Demo\nUses Flask."),
            ("requirements.txt", "flask==3.0.0\nrequests==2.32.5\nFlask>=2\n"),
            ("Dockerfile", "FROM python:3.12"),
        ];
        let paths = ["README.md", "requirements.txt", "Dockerfile", "src/app.py"];
        let signals = extract_signals(files, &paths);

        assert_eq!(signals.languages, vec!["python"]);
        assert_eq!(signals.candidates, vec!["flask", "requests", "Docker"]);
        assert_eq!(signals.signals, vec!["Dockerfile present"]);
    }

    #[test]
    fn test_candidate_pool_order_and_suffix() {
        let signals = TechnologySignals {
            languages: vec!["python".into()],
            candidates: vec!["flask".into(), "Python".into()],
            signals: vec!["setup.py present".into()],
        };
        assert_eq!(signals.candidate_pool(), vec!["python", "flask", "setup.py"]);
    }

    #[test]
    fn test_declares_uses_normalized_names() {
        let signals = TechnologySignals {
            languages: vec!["go".into()],
            candidates: vec!["gin".into(), "@nestjs/core".into()],
            signals: Vec::new(),
        };
        assert!(signals.declares("gin"));
        assert!(signals.declares("go"));
        assert!(signals.declares("core"));
        assert!(!signals.declares("django"));
        assert!(!signals.declares(""));
    }
}
