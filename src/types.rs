use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Severity of an accessibility violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks conformance
    Error,
    /// Should be addressed
    Warning,
    /// Informational
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// Semantic file classification used to select detector groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    /// JSX/TSX component templates
    MarkupComponent,
    /// Plain JavaScript/TypeScript
    Script,
    /// HTML documents
    PageMarkup,
    /// CSS/SCSS
    Stylesheet,
    Unknown,
}

impl FileKind {
    /// Classify a path by its extension (case-insensitive)
    ///
    /// Never fails: anything without a known extension is `Unknown`.
    pub fn classify(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "jsx" | "tsx" => Self::MarkupComponent,
            "js" | "ts" => Self::Script,
            "html" | "htm" => Self::PageMarkup,
            "css" | "scss" => Self::Stylesheet,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarkupComponent => "markup-component",
            Self::Script => "script",
            Self::PageMarkup => "page-markup",
            Self::Stylesheet => "stylesheet",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1-based position within a source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub const START: Location = Location { line: 1, column: 1 };
}

/// An accessibility violation found by a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Rule identifier, shared by every occurrence of the rule
    pub id: String,
    pub severity: Severity,
    /// WCAG success criteria (never empty)
    pub wcag_criteria: Vec<String>,
    pub title: String,
    pub description: String,
    pub help: String,
    /// Line (1-indexed)
    pub line: usize,
    /// Column (1-indexed, 1 when unknown)
    pub column: usize,
    /// Excerpt that triggered the finding
    pub code: String,
    /// Remediation hints (never empty)
    pub fix_suggestions: Vec<String>,
    pub tags: Vec<String>,
}

impl Violation {
    pub fn new(id: &str, severity: Severity, title: &str) -> Self {
        Self {
            id: id.to_string(),
            severity,
            wcag_criteria: Vec::new(),
            title: title.to_string(),
            description: String::new(),
            help: String::new(),
            line: 1,
            column: 1,
            code: String::new(),
            fix_suggestions: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_wcag(mut self, criterion: &str) -> Self {
        self.wcag_criteria.push(criterion.to_string());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = help.to_string();
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.line = location.line.max(1);
        self.column = location.column.max(1);
        self
    }

    /// Attach the offending excerpt, truncated for display
    pub fn with_code(mut self, code: &str) -> Self {
        self.code = crate::util::excerpt(code);
        self
    }

    pub fn with_fix(mut self, suggestion: &str) -> Self {
        self.fix_suggestions.push(suggestion.to_string());
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    /// Whether the guideline references and remediation hints are present
    pub fn is_well_formed(&self) -> bool {
        !self.wcag_criteria.is_empty() && !self.fix_suggestions.is_empty() && self.line >= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_table() {
        let cases = [
            ("App.jsx", FileKind::MarkupComponent),
            ("App.TSX", FileKind::MarkupComponent),
            ("index.js", FileKind::Script),
            ("main.ts", FileKind::Script),
            ("index.html", FileKind::PageMarkup),
            ("legacy.HTM", FileKind::PageMarkup),
            ("site.css", FileKind::Stylesheet),
            ("theme.scss", FileKind::Stylesheet),
            ("README.md", FileKind::Unknown),
            ("Makefile", FileKind::Unknown),
        ];
        for (path, expected) in cases {
            assert_eq!(FileKind::classify(Path::new(path)), expected, "{}", path);
        }
    }

    #[test]
    fn test_classify_is_stable() {
        let path = Path::new("src/components/Nav.tsx");
        assert_eq!(FileKind::classify(path), FileKind::classify(path));
    }

    #[test]
    fn test_file_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&FileKind::MarkupComponent).unwrap();
        assert_eq!(json, "\"markup-component\"");
        assert_eq!(FileKind::PageMarkup.to_string(), "page-markup");
    }

    #[test]
    fn test_violation_builder() {
        let v = Violation::new("img-missing-alt", Severity::Error, "Image missing alt")
            .with_wcag("1.1.1")
            .with_fix("Add alt")
            .at(Location { line: 0, column: 0 });
        assert_eq!(v.line, 1);
        assert_eq!(v.column, 1);
        assert!(v.is_well_formed());
    }

    #[test]
    fn test_violation_serializes_camel_case() {
        let v = Violation::new("x", Severity::Warning, "X").with_wcag("2.4.4");
        let json = serde_json::to_value(&v).unwrap();
        assert!(json.get("wcagCriteria").is_some());
        assert!(json.get("fixSuggestions").is_some());
        assert_eq!(json["severity"], "warning");
    }
}
