//! Repository path heuristics.
//!
//! All paths are repository-relative and `/`-separated, as reported by the
//! code host's tree listing.

/// Directory names whose contents are vendored, generated, or cache output.
/// Matched at any depth.
pub const SKIP_DIR_NAMES: &[&str] = &[
    "node_modules",
    "vendor",
    "third_party",
    "dist",
    "build",
    "out",
    "target",
    "coverage",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".git",
];

/// Binary and asset extensions never worth retrieving.
pub const SKIP_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".zip", ".tar", ".gz", ".7z", ".bin", ".exe",
    ".dll", ".so", ".dylib", ".onnx", ".pt", ".pth", ".ckpt", ".parquet",
];

/// Lockfiles that carry little signal relative to their size.
pub const DEPRIORITIZED_LOCKFILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "Pipfile.lock",
];

/// Conventional source roots.
pub const SOURCE_ROOTS: &[&str] = &["src/", "app/", "lib/"];

/// Final path component.
#[must_use]
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Parent directory, or `""` for root-level entries.
#[must_use]
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Lower-cased extension including the leading dot, or `""` when absent.
///
/// Dotfiles such as `.gitignore` have no extension.
#[must_use]
pub fn extension(path: &str) -> String {
    let name = basename(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx..].to_lowercase(),
        _ => String::new(),
    }
}

/// Number of `/` separators in the path.
#[must_use]
pub fn depth(path: &str) -> usize {
    path.matches('/').count()
}

/// Whether the path lives under `src/`, `app/` or `lib/`.
#[must_use]
pub fn under_source_root(path: &str) -> bool {
    SOURCE_ROOTS.iter().any(|root| path.starts_with(root))
}

/// Whether a tree entry should be dropped before selection.
#[must_use]
pub fn should_skip(path: &str) -> bool {
    let norm = path.trim_matches('/');
    let mut components = norm.split('/');
    // Only directory components count, never the file name itself.
    components.next_back();
    if components.any(|dir| SKIP_DIR_NAMES.contains(&dir)) {
        return true;
    }

    let lower = norm.to_lowercase();
    if lower.ends_with(".min.js") || lower.ends_with(".map") {
        return true;
    }

    let ext = extension(norm);
    SKIP_EXTENSIONS.contains(&ext.as_str())
}

/// Whether the path is a test, spec, or lockfile.
#[must_use]
pub fn is_deprioritized(path: &str) -> bool {
    let norm = path.trim_matches('/');
    let base = basename(norm);
    if DEPRIORITIZED_LOCKFILES.contains(&base) {
        return true;
    }
    let base_lower = base.to_lowercase();
    norm.to_lowercase().starts_with("tests/")
        || base_lower.contains("test")
        || base_lower.contains("spec")
}
