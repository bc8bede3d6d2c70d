use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Maximum number of characters kept in a violation excerpt
pub const MAX_EXCERPT_CHARS: usize = 120;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Trim an excerpt and truncate it by characters, marking the cut with `...`
pub fn excerpt(code: &str) -> String {
    let trimmed = code.trim();
    if trimmed.chars().count() <= MAX_EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_EXCERPT_CHARS).collect();
    out.push_str("...");
    out
}

/// Remove markup tags and surrounding whitespace, leaving the visible text
pub fn strip_tags(markup: &str) -> String {
    TAG_RE.replace_all(markup, "").trim().to_string()
}

/// File name used to key per-file artifacts
pub fn artifact_stem(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string())
}
