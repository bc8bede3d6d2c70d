use super::matches::{Pattern, Source};
use crate::types::{Location, Severity, Violation};
use std::sync::LazyLock;

pub const FOCUS_STYLES_MISSING: &str = "focus-styles-missing";
pub const OUTLINE_NONE: &str = "outline-none-no-alternative";
pub const FONT_SIZE_TOO_SMALL: &str = "font-size-too-small";
pub const FONT_SIZE_SMALL: &str = "font-size-small";
pub const TOUCH_TARGET_SMALL: &str = "touch-target-small";
pub const INTERACTIVE_DISPLAY_NONE: &str = "interactive-display-none";
pub const COLOR_TRANSPARENT: &str = "color-transparent";
pub const POINTER_EVENTS_NONE: &str = "pointer-events-none-interactive";

/// Bytes on each side of a declaration used when brace matching fails
pub const FALLBACK_WINDOW: usize = 200;

/// Font sizes below this are errors
const MIN_FONT_PX: f64 = 10.0;
/// Font sizes below this (and at least `MIN_FONT_PX`) are warnings
const SMALL_FONT_PX: f64 = 12.0;
/// Minimum touch target edge
const MIN_TARGET_PX: f64 = 44.0;

const INTERACTIVE_SELECTOR_TOKENS: &[&str] = &["button", "btn", "link", "a", "input", "click"];
const INTERACTIVE_CLASS_TOKENS: &[&str] = &["button", "btn", "link", "menu", "nav", "interactive"];

static FOCUS_RE: LazyLock<Pattern> = LazyLock::new(|| Pattern::new(r"(?i):focus"));

static OUTLINE_NONE_RE: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(r"(?im)(?:^|[^-\w])(outline\s*:\s*(none|0(?:px)?)\s*(?:!\s*important)?)\s*(?:;|\}|$)")
});

static OUTLINE_VALUE_RE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(r"(?i)(?:^|[^-\w])outline\s*:\s*([^;}]*)"));

static BOX_SHADOW_RE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(r"(?i)(?:^|[^-\w])box-shadow\s*:\s*([^;}]*)"));

static BORDER_RE: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(r"(?i)(?:^|[^-\w])border(?:-(?:top|right|bottom|left|color|style|width))?\s*:\s*([^;}]*)")
});

static FONT_PX_RE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(r"(?i)font-size\s*:\s*(\d+(?:\.\d+)?)px"));

static DIMENSION_RE: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(r"(?i)(?:^|[^-\w])((min-width|min-height|width|height)\s*:\s*(\d+(?:\.\d+)?)px)")
});

static RULE_BLOCK_RE: LazyLock<Pattern> = LazyLock::new(|| Pattern::new(r"([^{}]+)\{([^{}]*)\}"));

static CLASS_RE: LazyLock<Pattern> = LazyLock::new(|| Pattern::new(r"\.(-?[_a-zA-Z][\w-]*)"));

static DISPLAY_NONE_RE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(r"(?i)(?:^|[^-\w])display\s*:\s*none\b"));

static COLOR_TRANSPARENT_RE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(r"(?i)(?:^|[^-\w])(color\s*:\s*transparent)\b"));

static INTERACTIVE_ELEMENT_RE: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(r"(?i)(?:^|[\s,>+~(])(button|a|input|select|textarea)(?:$|[\s,.:#\[>+~)])")
});

static POINTER_EVENTS_NONE_RE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(r"(?i)pointer-events\s*:\s*none\b"));

static COMMENT_RE: LazyLock<Pattern> = LazyLock::new(|| Pattern::new(r"(?s)/\*.*?\*/"));

/// Rule block enclosing a declaration
struct Block<'t> {
    selector: String,
    body: &'t str,
}

/// Locate the rule block around `start..end`: back to the nearest unmatched
/// `{`, forward to the next `}`
fn enclosing_block(text: &str, start: usize, end: usize) -> Option<Block<'_>> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut open = None;
    for i in (0..start.min(bytes.len())).rev() {
        match bytes[i] {
            b'}' => depth += 1,
            b'{' if depth == 0 => {
                open = Some(i);
                break;
            }
            b'{' => depth -= 1,
            _ => {}
        }
    }
    let open = open?;
    let close = end + text.get(end..)?.find('}')?;

    let selector_start = text[..open]
        .rfind(['{', '}', ';'])
        .map(|i| i + 1)
        .unwrap_or(0);
    let selector = COMMENT_RE
        .captures(&text[selector_start..open])
        .fold(text[selector_start..open].to_string(), |acc, c| {
            acc.replace(c.get(0).map(|m| m.as_str()).unwrap_or(""), "")
        })
        .trim()
        .to_string();

    Some(Block {
        selector,
        body: &text[open + 1..close],
    })
}

/// Text within `FALLBACK_WINDOW` bytes of `start..end`, widened to char boundaries
///
/// Stands in for the rule block when brace matching fails and may pull in
/// declarations of neighbouring rules.
fn fallback_window(text: &str, start: usize, end: usize) -> &str {
    let mut lo = start.saturating_sub(FALLBACK_WINDOW);
    while !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + FALLBACK_WINDOW).min(text.len());
    while !text.is_char_boundary(hi) {
        hi += 1;
    }
    &text[lo..hi]
}

fn is_disabling(value: &str) -> bool {
    let value = value.trim().trim_end_matches("!important").trim().to_ascii_lowercase();
    value.is_empty() || value == "none" || value == "0" || value == "0px"
}

/// Whether a block carries a visible focus indicator besides the removed outline
fn has_alternative_indicator(body: &str) -> bool {
    let any_visible = |pattern: &Pattern| {
        pattern
            .captures(body)
            .any(|c| !is_disabling(c.get(1).map(|m| m.as_str()).unwrap_or("")))
    };
    any_visible(&BOX_SHADOW_RE) || any_visible(&BORDER_RE) || any_visible(&OUTLINE_VALUE_RE)
}

/// Stylesheets should style focus states somewhere
pub fn focus_styles(source: &Source) -> Vec<Violation> {
    if FOCUS_RE.is_match(source.text()) {
        return vec![];
    }
    vec![
        Violation::new(FOCUS_STYLES_MISSING, Severity::Warning, "No focus styles defined")
            .with_wcag("2.4.7")
            .with_description("The stylesheet defines no :focus or :focus-visible rules, so keyboard focus may be hard to see.")
            .with_help("Define visible focus styles for interactive elements.")
            .at(Location::START)
            .with_code(source.line_at(0))
            .with_fix("Add a :focus-visible rule with a clear outline, e.g. outline: 2px solid currentColor")
            .with_tag("wcag2aa")
            .with_tag("focus"),
    ]
}

/// `outline: none` without a replacement indicator, or inside a `:focus` rule
pub fn outline_removal(source: &Source) -> Vec<Violation> {
    let text = source.text();
    OUTLINE_NONE_RE
        .matches(source)
        .filter_map(|hit| {
            let decl_start = hit.group_start(1).unwrap_or(hit.start());
            let decl = hit.group(1).unwrap_or(hit.as_str());
            let decl_end = decl_start + decl.len();

            let (in_focus_rule, selector, alternative) =
                match enclosing_block(text, decl_start, decl_end) {
                    Some(block) => {
                        let rest = block.body.replacen(decl, "", 1);
                        (
                            block.selector.to_ascii_lowercase().contains(":focus"),
                            block.selector,
                            has_alternative_indicator(&rest),
                        )
                    }
                    None => {
                        let window = fallback_window(text, decl_start, decl_end);
                        let rest = window.replacen(decl, "", 1);
                        (false, String::new(), has_alternative_indicator(&rest))
                    }
                };

            if !in_focus_rule && alternative {
                return None;
            }

            let description = if in_focus_rule {
                format!("\"{}\" removes the focus outline in a focus rule.", selector)
            } else if selector.is_empty() {
                "Outline is removed with no alternative focus indicator nearby.".to_string()
            } else {
                format!(
                    "\"{}\" removes the outline without a box-shadow, border or outline replacement.",
                    selector
                )
            };

            Some(
                Violation::new(OUTLINE_NONE, Severity::Error, "Focus indicator removed")
                    .with_wcag("2.4.7")
                    .with_description(description)
                    .with_help("Keep a visible focus indicator when removing the default outline.")
                    .at(source.location(decl_start))
                    .with_code(decl)
                    .with_fix("Replace with outline: 2px solid currentColor")
                    .with_fix("Provide an alternative such as box-shadow: 0 0 0 3px on :focus-visible")
                    .with_tag("wcag2aa")
                    .with_tag("focus"),
            )
        })
        .collect()
}

/// Pixel font sizes below readable thresholds
pub fn font_size(source: &Source) -> Vec<Violation> {
    FONT_PX_RE
        .matches(source)
        .filter_map(|hit| {
            let px: f64 = hit.group(1)?.parse().ok()?;
            let (id, severity, title) = if px < MIN_FONT_PX {
                (FONT_SIZE_TOO_SMALL, Severity::Error, "Font size too small")
            } else if px < SMALL_FONT_PX {
                (FONT_SIZE_SMALL, Severity::Warning, "Font size may be hard to read")
            } else {
                return None;
            };
            Some(
                Violation::new(id, severity, title)
                    .with_wcag("1.4.4")
                    .with_description(format!("Font size {}px is below the readable minimum.", px))
                    .with_help("Use at least 12px, preferably relative units such as rem.")
                    .at(hit.location())
                    .with_code(hit.as_str())
                    .with_fix("Increase the font size to at least 16px (1rem) for body text")
                    .with_fix("Use rem or em units so text scales with user settings")
                    .with_tag("wcag2aa")
                    .with_tag("typography"),
            )
        })
        .collect()
}

/// Interactive elements sized below the minimum touch target
pub fn touch_target(source: &Source) -> Vec<Violation> {
    let text = source.text();
    DIMENSION_RE
        .matches(source)
        .filter_map(|hit| {
            let px: f64 = hit.group(3)?.parse().ok()?;
            if px >= MIN_TARGET_PX {
                return None;
            }
            let decl_start = hit.group_start(1).unwrap_or(hit.start());
            let selector = match enclosing_block(text, decl_start, hit.end()) {
                Some(block) => block.selector,
                None => source.line_at(decl_start).to_string(),
            };
            let lower = selector.to_ascii_lowercase();
            if !INTERACTIVE_SELECTOR_TOKENS.iter().any(|t| lower.contains(t)) {
                return None;
            }
            let property = hit.group(2).unwrap_or("size");
            Some(
                Violation::new(TOUCH_TARGET_SMALL, Severity::Warning, "Touch target too small")
                    .with_wcag("2.5.5")
                    .with_wcag("2.5.8")
                    .with_description(format!(
                        "\"{}\" sets {} to {}px, below the 44px minimum target size.",
                        selector, property, px
                    ))
                    .with_help("Make interactive targets at least 44 by 44 CSS pixels.")
                    .at(source.location(decl_start))
                    .with_code(hit.group(1).unwrap_or(hit.as_str()))
                    .with_fix("Set min-width and min-height to at least 44px")
                    .with_fix("Add padding to enlarge the clickable area")
                    .with_tag("wcag2aaa")
                    .with_tag("touch"),
            )
        })
        .collect()
}

/// Interactive-looking classes hidden with `display: none`
pub fn hidden_interactive(source: &Source) -> Vec<Violation> {
    RULE_BLOCK_RE
        .matches(source)
        .filter_map(|hit| {
            let selector = hit.group(1)?;
            let body = hit.group(2)?;
            let interactive = CLASS_RE.captures(selector).any(|c| {
                let class = c.get(1).map(|m| m.as_str().to_ascii_lowercase()).unwrap_or_default();
                INTERACTIVE_CLASS_TOKENS.iter().any(|t| class.contains(t))
            });
            if !interactive || !DISPLAY_NONE_RE.is_match(body) {
                return None;
            }
            let leading = selector.len() - selector.trim_start().len();
            let selector = selector.trim();
            Some(
                Violation::new(
                    INTERACTIVE_DISPLAY_NONE,
                    Severity::Warning,
                    "Interactive element hidden with display: none",
                )
                .with_wcag("4.1.2")
                .with_wcag("2.1.1")
                .with_description(format!(
                    "\"{}\" hides an interactive element from every user, including keyboard and screen reader users.",
                    selector
                ))
                .with_help("Make sure hidden controls have an accessible way to be revealed.")
                .at(source.location(hit.start() + leading))
                .with_code(hit.as_str())
                .with_fix("Toggle visibility with aria-expanded and a keyboard-operable trigger")
                .with_fix("Use a visually-hidden pattern if the control should stay available to assistive technology")
                .with_tag("wcag2a")
                .with_tag("visibility"),
            )
        })
        .collect()
}

/// `color: transparent` makes text invisible
pub fn transparent_text(source: &Source) -> Vec<Violation> {
    COLOR_TRANSPARENT_RE
        .matches(source)
        .map(|hit| {
            let start = hit.group_start(1).unwrap_or(hit.start());
            Violation::new(COLOR_TRANSPARENT, Severity::Warning, "Transparent text color")
                .with_wcag("1.4.3")
                .with_description("Text set to color: transparent has no contrast and is invisible to sighted users.")
                .with_help("Use a visible text color with sufficient contrast.")
                .at(source.location(start))
                .with_code(hit.group(1).unwrap_or(hit.as_str()))
                .with_fix("Use a solid color with at least 4.5:1 contrast against the background")
                .with_tag("wcag2aa")
                .with_tag("color")
        })
        .collect()
}

/// Interactive elements with pointer events disabled, first occurrence only
pub fn pointer_events(source: &Source) -> Vec<Violation> {
    RULE_BLOCK_RE
        .matches(source)
        .find_map(|hit| {
            let selector = hit.group(1)?.trim();
            let body = hit.group(2)?;
            if !INTERACTIVE_ELEMENT_RE.is_match(selector) || !POINTER_EVENTS_NONE_RE.is_match(body) {
                return None;
            }
            let leading = hit.as_str().len() - hit.as_str().trim_start().len();
            Some(
                Violation::new(
                    POINTER_EVENTS_NONE,
                    Severity::Warning,
                    "Pointer events disabled on interactive element",
                )
                .with_wcag("2.1.1")
                .with_description(format!(
                    "\"{}\" disables pointer events while the control may still be focusable.",
                    selector
                ))
                .with_help("Use the disabled attribute or aria-disabled instead of pointer-events: none.")
                .at(source.location(hit.start() + leading))
                .with_code(hit.as_str())
                .with_fix("Use the disabled attribute for form controls")
                .with_fix("Add aria-disabled=\"true\" and block keyboard activation as well")
                .with_tag("wcag2a")
                .with_tag("keyboard"),
            )
        })
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(f: fn(&Source) -> Vec<Violation>, text: &str) -> Vec<String> {
        f(&Source::new(text)).into_iter().map(|v| v.id).collect()
    }

    #[test]
    fn test_focus_styles_missing() {
        assert_eq!(ids(focus_styles, ".a { color: red; }"), vec![FOCUS_STYLES_MISSING]);
        assert!(ids(focus_styles, "a:focus-visible { outline: 2px solid; }").is_empty());
    }

    #[test]
    fn test_outline_none_inside_focus_rule() {
        let found = outline_removal(&Source::new("button:focus { outline: none; }"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, OUTLINE_NONE);
        assert_eq!(found[0].severity, Severity::Error);
        assert_eq!(found[0].column, 16);
    }

    #[test]
    fn test_outline_none_in_focus_rule_flagged_despite_alternative() {
        let css = "a:focus { outline: none; box-shadow: 0 0 0 3px blue; }";
        assert_eq!(ids(outline_removal, css), vec![OUTLINE_NONE]);
    }

    #[test]
    fn test_outline_none_with_alternative() {
        assert!(ids(outline_removal, ".btn { outline: none; box-shadow: 0 0 0 2px #00f; }").is_empty());
        assert!(ids(outline_removal, ".btn { outline: 0; border: 2px solid #000; }").is_empty());
        assert!(ids(outline_removal, ".btn {\n  outline: none;\n  outline: 3px dashed red;\n}").is_empty());
    }

    #[test]
    fn test_outline_none_without_alternative() {
        assert_eq!(ids(outline_removal, ".btn { outline: none !important; }"), vec![OUTLINE_NONE]);
        assert_eq!(ids(outline_removal, ".btn { outline: 0; box-shadow: none; border: 0; }"), vec![OUTLINE_NONE]);
    }

    #[test]
    fn test_outline_zero_px() {
        assert_eq!(ids(outline_removal, ".btn { outline: 0px; }"), vec![OUTLINE_NONE]);
        assert!(ids(outline_removal, ".btn { outline: 0px; box-shadow: 0 0 0 2px #00f; }").is_empty());
        assert!(ids(outline_removal, ".btn { outline: 0px solid red; }").is_empty());
    }

    #[test]
    fn test_outline_alternative_in_other_rule_not_counted() {
        let css = ".a { outline: none; }\n.b { box-shadow: 0 0 0 2px red; }";
        assert_eq!(ids(outline_removal, css), vec![OUTLINE_NONE]);
    }

    #[test]
    fn test_outline_fallback_window() {
        // No enclosing braces: the surrounding window decides
        assert_eq!(ids(outline_removal, "outline: none;"), vec![OUTLINE_NONE]);
        assert!(ids(outline_removal, "outline: none;\nborder: 1px solid blue;").is_empty());
    }

    #[test]
    fn test_outline_nested_block() {
        let css = "@media (min-width: 600px) {\n  .nav a:focus { outline: 0; }\n}";
        let found = outline_removal(&Source::new(css));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 2);
        assert!(found[0].description.contains(".nav a:focus"));
    }

    #[test]
    fn test_outline_width_is_not_outline_none() {
        assert!(ids(outline_removal, ".a { outline-width: 0; }").is_empty());
        assert!(ids(outline_removal, ".a { outline: 0.5px solid; }").is_empty());
    }

    #[test]
    fn test_font_size_thresholds() {
        assert_eq!(ids(font_size, "p { font-size: 8px; }"), vec![FONT_SIZE_TOO_SMALL]);
        assert_eq!(ids(font_size, "p { font-size: 11px; }"), vec![FONT_SIZE_SMALL]);
        assert_eq!(ids(font_size, "p { font-size: 10px; }"), vec![FONT_SIZE_SMALL]);
        assert_eq!(ids(font_size, "p { font-size: 9.5px; }"), vec![FONT_SIZE_TOO_SMALL]);
        assert!(ids(font_size, "p { font-size: 12px; }").is_empty());
        assert!(ids(font_size, "p { font-size: 14px; }").is_empty());
        assert!(ids(font_size, "p { font-size: 0.75rem; }").is_empty());
    }

    #[test]
    fn test_font_size_severities() {
        let found = font_size(&Source::new("a { font-size: 8px }\nb { font-size: 11px }"));
        assert_eq!(found[0].severity, Severity::Error);
        assert_eq!(found[1].severity, Severity::Warning);
        assert_eq!(found[1].line, 2);
    }

    #[test]
    fn test_touch_target_interactive_selector() {
        assert_eq!(ids(touch_target, ".icon-btn { width: 24px; height: 24px; }").len(), 2);
        assert_eq!(ids(touch_target, "button.close {\n  min-height: 30px;\n}"), vec![TOUCH_TARGET_SMALL]);
    }

    #[test]
    fn test_touch_target_threshold_is_strict() {
        assert!(ids(touch_target, ".btn { width: 44px; }").is_empty());
        assert_eq!(ids(touch_target, ".btn { width: 43.9px; }"), vec![TOUCH_TARGET_SMALL]);
    }

    #[test]
    fn test_touch_target_ignores_other_properties() {
        assert!(ids(touch_target, ".btn { max-width: 20px; line-height: 10px; }").is_empty());
        assert!(ids(touch_target, "div { width: 10px; }").is_empty());
    }

    #[test]
    fn test_hidden_interactive_class() {
        assert_eq!(ids(hidden_interactive, ".nav-menu { display: none; }"), vec![INTERACTIVE_DISPLAY_NONE]);
        assert_eq!(ids(hidden_interactive, "@media print {\n  .btn-primary { display:none }\n}"), vec![INTERACTIVE_DISPLAY_NONE]);
        assert!(ids(hidden_interactive, ".tooltip { display: none; }").is_empty());
        assert!(ids(hidden_interactive, ".menu { display: flex; }").is_empty());
        assert!(ids(hidden_interactive, "nav { display: none; }").is_empty());
    }

    #[test]
    fn test_hidden_interactive_location() {
        let found = hidden_interactive(&Source::new(".a { color: red; }\n\n.link { display: none; }"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 3);
        assert_eq!(found[0].column, 1);
    }

    #[test]
    fn test_color_transparent() {
        assert_eq!(ids(transparent_text, ".x { color: transparent; }"), vec![COLOR_TRANSPARENT]);
        assert!(ids(transparent_text, ".x { background-color: transparent; }").is_empty());
        assert!(ids(transparent_text, ".x { color: #333; }").is_empty());
    }

    #[test]
    fn test_pointer_events_first_only() {
        let css = "button { pointer-events: none; }\ninput[type=text] { pointer-events: none; }";
        let found = pointer_events(&Source::new(css));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 1);
    }

    #[test]
    fn test_pointer_events_non_interactive_selector() {
        assert!(ids(pointer_events, ".overlay { pointer-events: none; }").is_empty());
        assert!(ids(pointer_events, "table { pointer-events: none; }").is_empty());
        assert_eq!(ids(pointer_events, ".card > a { pointer-events: none; }"), vec![POINTER_EVENTS_NONE]);
    }

    #[test]
    fn test_enclosing_block_selector() {
        let css = "/* nav */ .nav a:hover { color: red; outline: none; }";
        let at = css.find("outline").unwrap();
        let block = enclosing_block(css, at, at + 13).unwrap();
        assert_eq!(block.selector, ".nav a:hover");
        assert!(block.body.contains("color: red"));
    }

    #[test]
    fn test_enclosing_block_unmatched() {
        assert!(enclosing_block("a: b; }", 0, 4).is_none());
        assert!(enclosing_block(".a { outline: none;", 5, 18).is_none());
    }

    #[test]
    fn test_fallback_window_char_boundaries() {
        let text = format!("{}outline: none;{}", "é".repeat(150), "ü".repeat(150));
        let start = text.find("outline").unwrap();
        let window = fallback_window(&text, start, start + 13);
        assert!(window.contains("outline: none"));
    }
}
