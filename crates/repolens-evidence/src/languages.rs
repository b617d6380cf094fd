use repolens_utils::lists::push_unique_ci;
use repolens_utils::paths::extension;

/// Language name for a lower-cased extension (with its leading dot).
#[must_use]
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let lang = match ext {
        ".py" => "python",
        ".js" | ".ts" | ".tsx" | ".jsx" => "javascript",
        ".java" => "java",
        ".go" => "go",
        ".rs" => "rust",
        ".rb" => "ruby",
        ".php" => "php",
        ".cs" => "c#",
        ".cpp" => "c++",
        ".c" => "c",
        ".kt" => "kotlin",
        ".swift" => "swift",
        ".sh" => "shell",
        _ => return None,
    };
    Some(lang)
}

/// Languages inferred from file extensions, in order of first appearance.
#[must_use]
pub fn infer_languages<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    let mut languages = Vec::new();
    for path in paths {
        if let Some(lang) = language_for_extension(&extension(path.as_ref())) {
            push_unique_ci(&mut languages, lang);
        }
    }
    languages
}
