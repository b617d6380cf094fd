//! Deterministic multi-pass file selection.

use std::collections::{HashMap, HashSet};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use once_cell::sync::Lazy;
use repolens_github::TreeEntry;
use repolens_utils::paths::{basename, depth, dirname, is_deprioritized, under_source_root};

/// Dependency and build manifests, matched on the exact file name.
pub const DEPENDENCY_FILES: &[&str] = &[
    "requirements.txt",
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "package.json",
    "tsconfig.json",
    "go.mod",
    "Cargo.toml",
    "pom.xml",
    "build.gradle",
    "Dockerfile",
    "docker-compose.yml",
];

/// Maximum selections from any single directory.
pub const FOLDER_CAP: usize = 3;

/// Maximum depth for the shallow-source pass.
const MAX_SOURCE_DEPTH: usize = 3;

/// Entrypoint and wiring file patterns, matched against the lower-cased path.
const ENTRYPOINT_PATTERNS: &[&str] = &[
    "**/main.*",
    "**/app.*",
    "**/server.*",
    "**/index.*",
    "**/*wsgi*",
    "**/*asgi*",
    "cmd/**/main.go",
];

static ENTRYPOINTS: Lazy<GlobSet> = Lazy::new(|| {
    let mut builder = GlobSetBuilder::new();
    for pattern in ENTRYPOINT_PATTERNS {
        builder.add(
            GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .unwrap(),
        );
    }
    builder.build().unwrap()
});

fn is_overview(path: &str) -> bool {
    let lower = path.to_lowercase();
    if !lower.contains('/') {
        return lower == "readme" || lower.starts_with("readme.");
    }
    // Only the top level of docs/, not nested guides.
    match lower.strip_prefix("docs/") {
        Some(rest) => {
            !rest.contains('/') && (rest.ends_with("index.md") || rest.ends_with("readme.md"))
        }
        None => false,
    }
}

fn is_dependency_manifest(path: &str) -> bool {
    DEPENDENCY_FILES.contains(&basename(path))
}

fn is_entrypoint(path: &str) -> bool {
    ENTRYPOINTS.is_match(path.to_lowercase())
}

fn is_shallow_source(path: &str) -> bool {
    !is_deprioritized(path) && under_source_root(path) && depth(path) <= MAX_SOURCE_DEPTH
}

/// Accumulates picks under the per-directory cap.
struct Picker<'a> {
    limit: usize,
    picked: Vec<&'a str>,
    seen: HashSet<&'a str>,
    per_folder: HashMap<&'a str, usize>,
}

impl<'a> Picker<'a> {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            picked: Vec::new(),
            seen: HashSet::new(),
            per_folder: HashMap::new(),
        }
    }

    fn full(&self) -> bool {
        self.picked.len() >= self.limit
    }

    fn add(&mut self, path: &'a str) {
        if self.full() || self.seen.contains(path) {
            return;
        }
        let count = self.per_folder.entry(dirname(path)).or_insert(0);
        if *count >= FOLDER_CAP {
            return;
        }
        *count += 1;
        self.seen.insert(path);
        self.picked.push(path);
    }

    /// Add every path matching `pred`, in order, until the limit is reached.
    fn pass(&mut self, paths: &[&'a str], pred: impl Fn(&str) -> bool) {
        for &path in paths {
            if self.full() {
                return;
            }
            if pred(path) {
                self.add(path);
            }
        }
    }
}

/// Pick up to `limit` paths without any model involvement.
///
/// Passes, in order: overview docs, dependency manifests, entrypoints,
/// shallow non-test source under `src/`, `app/` or `lib/`, then the smallest
/// remaining non-deprioritized files. Every pass honors [`FOLDER_CAP`] and
/// stops as soon as `limit` paths are picked.
#[must_use]
pub fn fallback_selection(entries: &[TreeEntry], limit: usize) -> Vec<String> {
    let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    let mut picker = Picker::new(limit);

    picker.pass(&paths, is_overview);
    picker.pass(&paths, is_dependency_manifest);
    picker.pass(&paths, is_entrypoint);
    picker.pass(&paths, is_shallow_source);

    if !picker.full() {
        let mut by_size: Vec<&TreeEntry> = entries.iter().collect();
        by_size.sort_by_key(|entry| entry.size);
        let smallest: Vec<&str> = by_size.iter().map(|e| e.path.as_str()).collect();
        picker.pass(&smallest, |path| !is_deprioritized(path));
    }

    picker.picked.into_iter().map(str::to_string).collect()
}
