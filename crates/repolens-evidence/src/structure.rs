//! Structure grounding.
//!
//! Bullets that mention file paths must name something that exists in the
//! repository tree. Unverified paths are stripped from bullets that still say
//! something generic about the layout, and bullets with nothing else to say
//! are dropped.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use repolens_utils::paths::extension;
use repolens_utils::tokens::collapse_whitespace;

pub const GENERIC_STRUCTURE_TERMS: &[&str] = &[
    "project",
    "repository",
    "codebase",
    "source",
    "module",
    "component",
    "service",
    "api",
    "docs",
    "documentation",
    "tests",
    "config",
    "configuration",
];

/// Extensions treated as file references even when the tree has none.
pub const COMMON_FILE_EXTENSIONS: &[&str] = &[
    "py", "md", "rst", "txt", "toml", "json", "yml", "yaml", "ini", "cfg", "xml", "go", "rs",
    "js", "ts", "tsx", "jsx", "java", "sh",
];

pub const GENERALIZED_MARKER: &str = " (generalized from available repository evidence).";

pub const GENERIC_FALLBACK_BULLET: &str =
    "Repository structure includes generic source, configuration, and docs areas.";

static PATH_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9_.\-/]+").unwrap());

const TOKEN_TRIM: &[char] = &['.', ',', ':', ';', '(', ')', '[', ']', '{', '}'];

/// What happened to one structure bullet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulletOutcome {
    /// No path claims, or at least one claim resolved
    Kept(String),
    /// Unverified paths were stripped
    Generalized(String),
    /// Unverified paths and no generic wording to fall back on
    Dropped,
}

/// Paths and directories of a repository tree, for resolving path claims.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    paths: HashSet<String>,
    directories: HashSet<String>,
    extensions: HashSet<String>,
}

impl TreeIndex {
    #[must_use]
    pub fn new<S: AsRef<str>>(paths: &[S]) -> Self {
        let mut index = Self::default();
        for path in paths {
            let path = path.as_ref();
            index.paths.insert(path.to_string());
            let ext = extension(path);
            if let Some(bare) = ext.strip_prefix('.') {
                index.extensions.insert(bare.to_string());
            }
            let mut dir = path;
            while let Some((parent, _)) = dir.rsplit_once('/') {
                if !index.directories.insert(parent.to_string()) {
                    break;
                }
                dir = parent;
            }
        }
        index
    }

    /// Whether `token` names a file or directory of the tree. Case-sensitive.
    #[must_use]
    pub fn resolves(&self, token: &str) -> bool {
        let token = token.strip_prefix("./").unwrap_or(token);
        if self.paths.contains(token) {
            return true;
        }
        let dir = token.trim_end_matches('/');
        !dir.is_empty() && self.directories.contains(dir)
    }

    /// Whether a stripped token looks like a file or path reference.
    #[must_use]
    pub fn looks_like_path(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        if token.contains('/') {
            return true;
        }
        let Some((stem, ext)) = token.rsplit_once('.') else {
            return false;
        };
        let ext = ext.to_lowercase();
        stem.chars().count() > 1
            && (self.extensions.contains(&ext) || COMMON_FILE_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Path-like tokens of `text`, with surrounding punctuation stripped.
    #[must_use]
    pub fn path_refs(&self, text: &str) -> Vec<String> {
        PATH_TOKEN
            .find_iter(text)
            .map(|m| m.as_str().trim_matches(TOKEN_TRIM))
            .filter(|token| self.looks_like_path(token))
            .map(str::to_string)
            .collect()
    }
}

/// Whether a generic structural term occurs anywhere in the lower-cased `text`.
///
/// Matches inside words too: "microservices" carries "service" and
/// "resources" carries "source".
#[must_use]
pub fn has_generic_vocabulary(text: &str) -> bool {
    let lowered = text.to_lowercase();
    GENERIC_STRUCTURE_TERMS.iter().any(|term| lowered.contains(term))
}

/// Remove every token of `text` whose stripped form is in `refs`, keeping
/// surrounding punctuation, then tidy the result.
fn strip_refs(text: &str, refs: &[String]) -> String {
    let stripped = PATH_TOKEN.replace_all(text, |caps: &regex::Captures<'_>| {
        let raw = &caps[0];
        let core = raw.trim_matches(TOKEN_TRIM);
        if !core.is_empty() && refs.iter().any(|r| r == core) {
            raw.replacen(core, "", 1)
        } else {
            raw.to_string()
        }
    });
    collapse_whitespace(&stripped)
        .trim_matches([' ', ',', ';', ':', '-'])
        .to_string()
}

/// Ground one bullet against `tree`.
#[must_use]
pub fn ground_bullet(bullet: &str, tree: &TreeIndex) -> BulletOutcome {
    let text = bullet.trim();
    if text.is_empty() {
        return BulletOutcome::Dropped;
    }

    let refs = tree.path_refs(text);
    if refs.is_empty() || refs.iter().any(|r| tree.resolves(r)) {
        return BulletOutcome::Kept(text.to_string());
    }
    if !has_generic_vocabulary(text) {
        return BulletOutcome::Dropped;
    }

    let softened = strip_refs(text, &refs);
    if softened.is_empty() || !has_generic_vocabulary(&softened) {
        BulletOutcome::Generalized(GENERIC_FALLBACK_BULLET.to_string())
    } else {
        BulletOutcome::Generalized(format!("{softened}{GENERALIZED_MARKER}"))
    }
}

/// Outcome of grounding every structure bullet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureGrounding {
    /// Non-empty bullets, in model order
    pub claimed: Vec<String>,
    /// Surviving bullets, kept or generalized
    pub grounded: Vec<String>,
    /// Originals of the bullets that were generalized
    pub generalized: Vec<String>,
    /// Bullets removed entirely
    pub dropped: Vec<String>,
}

/// Ground `bullets` against the repository tree.
#[must_use]
pub fn ground_structure(bullets: &[String], tree: &TreeIndex) -> StructureGrounding {
    let mut grounding = StructureGrounding::default();
    for bullet in bullets {
        let text = bullet.trim();
        if text.is_empty() {
            continue;
        }
        grounding.claimed.push(text.to_string());
        match ground_bullet(text, tree) {
            BulletOutcome::Kept(kept) => grounding.grounded.push(kept),
            BulletOutcome::Generalized(softened) => {
                grounding.generalized.push(text.to_string());
                grounding.grounded.push(softened);
            }
            BulletOutcome::Dropped => grounding.dropped.push(text.to_string()),
        }
    }
    grounding
}
