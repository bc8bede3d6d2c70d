use super::matches::{Pattern, Source};
use super::{Attributes, TAG_ATTRS};
use crate::types::{Location, Severity, Violation};
use crate::util::strip_tags;
use std::sync::LazyLock;

pub const HTML_MISSING_LANG: &str = "html-missing-lang";
pub const HTML_MISSING_TITLE: &str = "html-missing-title";
pub const IFRAME_MISSING_TITLE: &str = "iframe-missing-title";

static HTML_RE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(&format!(r"(?is)<html\b{}>", TAG_ATTRS)));

static TITLE_RE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>"));

static IFRAME_RE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(&format!(r"(?is)<iframe\b{}>", TAG_ATTRS)));

/// The root element must declare the page language
pub fn document_lang(source: &Source) -> Vec<Violation> {
    let Some(hit) = HTML_RE.matches(source).next() else {
        return vec![];
    };
    let attrs = Attributes::parse(hit.group(1).unwrap_or(""));
    if attrs.get("lang").is_some_and(|l| !l.trim().is_empty()) || attrs.has("xml:lang") {
        return vec![];
    }
    vec![
        Violation::new(HTML_MISSING_LANG, Severity::Error, "Page language not declared")
            .with_wcag("3.1.1")
            .with_description("The <html> element has no lang attribute, so screen readers may use the wrong pronunciation.")
            .with_help("Add a lang attribute with the primary language of the page.")
            .at(hit.location())
            .with_code(hit.as_str())
            .with_fix("Add lang=\"en\" (or the page's language code) to <html>")
            .with_tag("wcag2a")
            .with_tag("language"),
    ]
}

/// The document needs a non-empty <title>
pub fn document_title(source: &Source) -> Vec<Violation> {
    let has_title = TITLE_RE
        .matches(source)
        .any(|hit| !strip_tags(hit.group(1).unwrap_or("")).is_empty());
    if has_title {
        return vec![];
    }
    vec![
        Violation::new(HTML_MISSING_TITLE, Severity::Error, "Page has no title")
            .with_wcag("2.4.2")
            .with_description("The document has no non-empty <title> element describing its topic or purpose.")
            .with_help("Add a <title> inside <head> that describes the page.")
            .at(Location::START)
            .with_code(source.line_at(0))
            .with_fix("Add <title>Descriptive page title</title> to <head>")
            .with_tag("wcag2a")
            .with_tag("structure"),
    ]
}

/// Frames need a title describing their content
pub fn frame_title(source: &Source) -> Vec<Violation> {
    IFRAME_RE
        .matches(source)
        .filter_map(|hit| {
            let attrs = Attributes::parse(hit.group(1).unwrap_or(""));
            if attrs.get("title").is_some_and(|t| !t.trim().is_empty()) {
                return None;
            }
            let src = attrs.get("src").unwrap_or("inline content");
            Some(
                Violation::new(IFRAME_MISSING_TITLE, Severity::Error, "Frame missing title")
                    .with_wcag("4.1.2")
                    .with_wcag("2.4.1")
                    .with_description(format!(
                        "<iframe> embedding \"{}\" has no title describing its content.",
                        src
                    ))
                    .with_help("Add a title attribute that describes the embedded content.")
                    .at(hit.location())
                    .with_code(hit.as_str())
                    .with_fix("Add title=\"...\" describing the frame's content")
                    .with_tag("wcag2a")
                    .with_tag("structure"),
            )
        })
        .collect()
}
