use super::{markup, page, style};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Replacement size for undersized fonts
const SUGGESTED_FONT_PX: u32 = 16;

static TAG_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*/?>\s*$").expect("valid regex"));
static OUTLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)outline\s*:\s*(?:none|0(?:px)?)\s*(?:!\s*important)?").expect("valid regex"));
static FONT_PX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(font-size\s*:\s*)\d+(?:\.\d+)?px").expect("valid regex"));
static DIMENSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)((?:min-)?(?:width|height)\s*:\s*)\d+(?:\.\d+)?px").expect("valid regex")
});
static TRANSPARENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(color\s*:\s*)transparent").expect("valid regex"));
static HTML_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<html\b").expect("valid regex"));
static BUTTON_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<button\b").expect("valid regex"));
static CONTAINER_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^<(div|span|section|article|li|p|td|tr)\b").expect("valid regex")
});

/// Suggested fix for a violation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixSuggestion {
    pub id: String,
    /// Rewritten excerpt, when a mechanical rewrite exists
    pub fixed_code: Option<String>,
    pub suggestions: Vec<String>,
}

/// Insert an attribute before the end of an opening tag
fn insert_attribute(code: &str, attribute: &str) -> Option<String> {
    let tag_end = code.find('>')?;
    let (open, rest) = code.split_at(tag_end + 1);
    let m = TAG_END_RE.find(open)?;
    Some(format!(
        "{} {}{}{}",
        &open[..m.start()],
        attribute,
        &open[m.start()..],
        rest
    ))
}

/// Suggest a fix for rule `id` given the offending `code`
///
/// Returns `None` for ids the catalog does not know.
pub fn suggest_fix(id: &str, code: &str) -> Option<FixSuggestion> {
    let code = code.trim();
    let (fixed_code, suggestions): (Option<String>, &[&str]) = match id {
        markup::IMG_MISSING_ALT => (
            insert_attribute(code, "alt=\"\""),
            &[
                "Describe the image content in the alt attribute",
                "Keep alt=\"\" only if the image is purely decorative",
            ],
        ),
        markup::CLICK_NON_INTERACTIVE => (
            CONTAINER_OPEN_RE
                .is_match(code)
                .then(|| {
                    let tag = CONTAINER_OPEN_RE.captures(code)?.get(1)?.as_str().to_string();
                    let opened = CONTAINER_OPEN_RE.replace(code, "<button type=\"button\"");
                    Some(opened.replace(&format!("</{}>", tag), "</button>"))
                })
                .flatten(),
            &[
                "Use a native <button> for actions and <a href> for navigation",
                "Otherwise add role=\"button\", tabindex=\"0\" and Enter/Space key handling",
            ],
        ),
        markup::BUTTON_EMPTY => (
            BUTTON_OPEN_RE
                .find(code)
                .map(|m| format!("{} aria-label=\"Describe action\"{}", &code[..m.end()], &code[m.end()..])),
            &["Add visible text or an aria-label describing the button's action"],
        ),
        markup::INPUT_MISSING_LABEL => (
            None,
            &[
                "Wrap the input in a <label> or add <label for=\"input-id\">",
                "Add aria-label or aria-labelledby when no visible label is possible",
            ],
        ),
        markup::LINK_NON_DESCRIPTIVE => (
            None,
            &["Rewrite the link text to describe its destination, e.g. \"Read the pricing guide\""],
        ),
        page::HTML_MISSING_LANG => (
            HTML_OPEN_RE
                .find(code)
                .map(|m| format!("{} lang=\"en\"{}", &code[..m.end()], &code[m.end()..])),
            &["Set lang to the primary language of the page"],
        ),
        page::HTML_MISSING_TITLE => (
            Some("<title>Descriptive page title</title>".to_string()),
            &["Add a unique, descriptive <title> inside <head>"],
        ),
        page::IFRAME_MISSING_TITLE => (
            insert_attribute(code, "title=\"Describe embedded content\""),
            &["Add a title attribute describing the frame's content"],
        ),
        style::FOCUS_STYLES_MISSING => (
            Some(":focus-visible {\n  outline: 2px solid currentColor;\n  outline-offset: 2px;\n}".to_string()),
            &["Define :focus-visible styles for links, buttons and form controls"],
        ),
        style::OUTLINE_NONE => (
            OUTLINE_RE
                .is_match(code)
                .then(|| OUTLINE_RE.replace_all(code, "outline: 2px solid currentColor").into_owned()),
            &[
                "Restore a visible outline on focus",
                "Or replace it with box-shadow: 0 0 0 3px on :focus-visible",
            ],
        ),
        style::FONT_SIZE_TOO_SMALL | style::FONT_SIZE_SMALL => (
            FONT_PX_RE
                .is_match(code)
                .then(|| {
                    FONT_PX_RE
                        .replace_all(code, format!("${{1}}{}px", SUGGESTED_FONT_PX).as_str())
                        .into_owned()
                }),
            &["Use at least 16px (1rem) for body text", "Prefer rem units so text follows user settings"],
        ),
        style::TOUCH_TARGET_SMALL => (
            DIMENSION_RE
                .is_match(code)
                .then(|| DIMENSION_RE.replace_all(code, "${1}44px").into_owned()),
            &["Make the target at least 44x44px, using padding if needed"],
        ),
        style::INTERACTIVE_DISPLAY_NONE => (
            None,
            &["Reveal the control through a keyboard-operable toggle with aria-expanded"],
        ),
        style::COLOR_TRANSPARENT => (
            TRANSPARENT_RE
                .is_match(code)
                .then(|| TRANSPARENT_RE.replace_all(code, "${1}currentColor").into_owned()),
            &["Use a visible text color with at least 4.5:1 contrast"],
        ),
        style::POINTER_EVENTS_NONE => (
            None,
            &["Use the disabled attribute or aria-disabled=\"true\" instead of pointer-events: none"],
        ),
        _ => return None,
    };

    Some(FixSuggestion {
        id: id.to_string(),
        fixed_code,
        suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
    })
}
