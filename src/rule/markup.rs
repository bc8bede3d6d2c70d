use super::matches::{Pattern, Source};
use super::{Attributes, TAG_ATTRS};
use crate::types::{Severity, Violation};
use crate::util::strip_tags;
use std::collections::HashSet;
use std::sync::LazyLock;

pub const IMG_MISSING_ALT: &str = "img-missing-alt";
pub const CLICK_NON_INTERACTIVE: &str = "click-handler-non-interactive";
pub const BUTTON_EMPTY: &str = "button-empty";
pub const INPUT_MISSING_LABEL: &str = "input-missing-label";
pub const LINK_NON_DESCRIPTIVE: &str = "link-non-descriptive";

/// Attributes that give an element an accessible name without visible text
const NAME_OVERRIDES: &[&str] = &["aria-label", "aria-labelledby"];

/// Input types that are either invisible or labelled by their value
const UNLABELLED_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "reset", "image"];

const NON_DESCRIPTIVE_LINK_TEXT: &[&str] = &[
    "click here",
    "here",
    "read more",
    "more",
    "learn more",
    "link",
    "this link",
    "click",
    "go",
];

static IMG_RE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(&format!(r"(?is)<img\b{}>", TAG_ATTRS)));

static CONTAINER_RE: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(&format!(
        r"(?is)<(div|span|section|article|li|p|td|tr)\b{}>",
        TAG_ATTRS
    ))
});

static BUTTON_RE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(&format!(r"(?is)<button\b{}>(.*?)</button\s*>", TAG_ATTRS)));

static INPUT_RE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(&format!(r"(?is)<input\b{}>", TAG_ATTRS)));

static LINK_RE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(&format!(r"(?is)<a\b{}>(.*?)</a\s*>", TAG_ATTRS)));

static LABEL_FOR_RE: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(r#"(?i)\b(?:for|htmlFor)\s*=\s*(?:"([^"]*)"|'([^']*)'|\{\s*["'`]([^"'`]*)["'`]\s*\})"#)
});

/// Images need an accessible name: `alt`, `aria-label` or `aria-labelledby`
pub fn image_alt(source: &Source) -> Vec<Violation> {
    IMG_RE
        .matches(source)
        .filter_map(|hit| {
            let attrs = Attributes::parse(hit.group(1).unwrap_or(""));
            if attrs.has("alt") || attrs.has_any(NAME_OVERRIDES) {
                return None;
            }
            let src = attrs.get("src").unwrap_or("unknown source");
            Some(
                Violation::new(IMG_MISSING_ALT, Severity::Error, "Image missing alternative text")
                    .with_wcag("1.1.1")
                    .with_description(format!(
                        "Image \"{}\" has no alt attribute, so screen readers cannot convey it.",
                        src
                    ))
                    .with_help("Add an alt attribute that describes the image, or alt=\"\" if it is decorative.")
                    .at(hit.location())
                    .with_code(hit.as_str())
                    .with_fix("Add alt=\"...\" describing the image content")
                    .with_fix("Use alt=\"\" for purely decorative images")
                    .with_tag("wcag2a")
                    .with_tag("images"),
            )
        })
        .collect()
}

/// Click handlers on containers that are not keyboard reachable
pub fn click_handler(source: &Source) -> Vec<Violation> {
    CONTAINER_RE
        .matches(source)
        .filter_map(|hit| {
            let attrs = Attributes::parse(hit.group(2).unwrap_or(""));
            if !attrs.has("onclick") {
                return None;
            }
            let tag = hit.group(1).unwrap_or("div").to_ascii_lowercase();
            Some(
                Violation::new(
                    CLICK_NON_INTERACTIVE,
                    Severity::Error,
                    "Click handler on non-interactive element",
                )
                .with_wcag("2.1.1")
                .with_wcag("4.1.2")
                .with_description(format!(
                    "<{}> has a click handler but cannot be reached or activated from the keyboard.",
                    tag
                ))
                .with_help("Use a <button> or <a> element for interactive controls.")
                .at(hit.location())
                .with_code(hit.as_str())
                .with_fix("Replace the element with <button type=\"button\">")
                .with_fix("If the element must stay, add role=\"button\", tabindex=\"0\" and a key handler for Enter and Space")
                .with_tag("wcag2a")
                .with_tag("keyboard"),
            )
        })
        .collect()
}

/// Buttons with no text content and no accessible-name override
pub fn button_name(source: &Source) -> Vec<Violation> {
    BUTTON_RE
        .matches(source)
        .filter_map(|hit| {
            let attrs = Attributes::parse(hit.group(1).unwrap_or(""));
            let text = strip_tags(hit.group(2).unwrap_or(""));
            if !text.is_empty() || attrs.has_any(NAME_OVERRIDES) || attrs.has("title") {
                return None;
            }
            Some(
                Violation::new(BUTTON_EMPTY, Severity::Error, "Button has no accessible name")
                    .with_wcag("4.1.2")
                    .with_description("Button renders no text and has no aria-label, so assistive technology announces it without a name.")
                    .with_help("Give the button visible text or an aria-label.")
                    .at(hit.location())
                    .with_code(hit.as_str())
                    .with_fix("Add visible text inside the button")
                    .with_fix("Add aria-label=\"...\" describing the action for icon-only buttons")
                    .with_tag("wcag2a")
                    .with_tag("forms"),
            )
        })
        .collect()
}

/// Form inputs without a label or accessible-name override
pub fn input_label(source: &Source) -> Vec<Violation> {
    let labelled: HashSet<&str> = LABEL_FOR_RE
        .matches(source)
        .filter_map(|hit| (1..=3).find_map(|i| hit.group(i)))
        .map(str::trim)
        .collect();

    INPUT_RE
        .matches(source)
        .filter_map(|hit| {
            let attrs = Attributes::parse(hit.group(1).unwrap_or(""));
            let input_type = attrs.get("type").unwrap_or("text").to_ascii_lowercase();
            if UNLABELLED_INPUT_TYPES.contains(&input_type.as_str()) || attrs.has_any(NAME_OVERRIDES) {
                return None;
            }

            let description = match attrs.get("id") {
                Some(id) if labelled.contains(id.trim()) => return None,
                Some(id) => format!(
                    "Input \"{}\" has no <label> whose for attribute references it.",
                    id
                ),
                None => "Input has neither an id for a <label> nor an aria-label.".to_string(),
            };

            Some(
                Violation::new(INPUT_MISSING_LABEL, Severity::Error, "Form input missing label")
                    .with_wcag("1.3.1")
                    .with_wcag("4.1.2")
                    .with_description(description)
                    .with_help("Associate a <label> with the input, or add aria-label/aria-labelledby.")
                    .at(hit.location())
                    .with_code(hit.as_str())
                    .with_fix("Add <label for=\"input-id\"> and a matching id on the input")
                    .with_fix("Add aria-label=\"...\" when a visible label is not possible")
                    .with_tag("wcag2a")
                    .with_tag("forms"),
            )
        })
        .collect()
}

/// Links whose whole text is a generic phrase like "click here"
pub fn link_text(source: &Source) -> Vec<Violation> {
    LINK_RE
        .matches(source)
        .filter_map(|hit| {
            let text = strip_tags(hit.group(2).unwrap_or(""))
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            if !NON_DESCRIPTIVE_LINK_TEXT.contains(&text.as_str()) {
                return None;
            }
            Some(
                Violation::new(LINK_NON_DESCRIPTIVE, Severity::Warning, "Link text is not descriptive")
                    .with_wcag("2.4.4")
                    .with_description(format!(
                        "Link text \"{}\" does not describe where the link goes.",
                        text
                    ))
                    .with_help("Use link text that makes sense out of context.")
                    .at(hit.location())
                    .with_code(hit.as_str())
                    .with_fix("Replace the text with a description of the destination")
                    .with_fix("Add aria-label with the full purpose if the visible text must stay")
                    .with_tag("wcag2a")
                    .with_tag("navigation"),
            )
        })
        .collect()
}
