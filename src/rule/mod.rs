pub mod fix;
pub mod markup;
pub mod matches;
pub mod page;
pub mod style;

use crate::types::{FileKind, Violation};
use matches::{Pattern, Source};
use std::sync::LazyLock;

/// Detector groups, keyed by eligibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    /// Component templates, scripts and HTML pages
    MarkupFamily,
    /// HTML pages only
    PageMarkup,
    /// CSS/SCSS only
    Stylesheet,
}

impl Group {
    /// Execution order of groups
    pub const ORDER: [Group; 3] = [Group::MarkupFamily, Group::PageMarkup, Group::Stylesheet];

    pub fn applies_to(self, kind: FileKind) -> bool {
        match self {
            Group::MarkupFamily => matches!(
                kind,
                FileKind::MarkupComponent | FileKind::Script | FileKind::PageMarkup
            ),
            Group::PageMarkup => kind == FileKind::PageMarkup,
            Group::Stylesheet => kind == FileKind::Stylesheet,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Group::MarkupFamily => "markup-family",
            Group::PageMarkup => "page-markup",
            Group::Stylesheet => "stylesheet",
        }
    }
}

/// A single detector in the catalog
pub struct Detector {
    /// Short detector name
    pub name: &'static str,
    pub group: Group,
    /// Rule ids this detector may emit
    pub ids: &'static [&'static str],
    pub check: fn(&Source) -> Vec<Violation>,
}

/// All detectors, in declared execution order
///
/// Eligible groups run in [`Group::ORDER`]; detector order is kept within a group.
pub static CATALOG: &[Detector] = &[
    Detector {
        name: "image-alt",
        group: Group::MarkupFamily,
        ids: &[markup::IMG_MISSING_ALT],
        check: markup::image_alt,
    },
    Detector {
        name: "click-handler",
        group: Group::MarkupFamily,
        ids: &[markup::CLICK_NON_INTERACTIVE],
        check: markup::click_handler,
    },
    Detector {
        name: "button-name",
        group: Group::MarkupFamily,
        ids: &[markup::BUTTON_EMPTY],
        check: markup::button_name,
    },
    Detector {
        name: "input-label",
        group: Group::MarkupFamily,
        ids: &[markup::INPUT_MISSING_LABEL],
        check: markup::input_label,
    },
    Detector {
        name: "link-text",
        group: Group::MarkupFamily,
        ids: &[markup::LINK_NON_DESCRIPTIVE],
        check: markup::link_text,
    },
    Detector {
        name: "document-lang",
        group: Group::PageMarkup,
        ids: &[page::HTML_MISSING_LANG],
        check: page::document_lang,
    },
    Detector {
        name: "document-title",
        group: Group::PageMarkup,
        ids: &[page::HTML_MISSING_TITLE],
        check: page::document_title,
    },
    Detector {
        name: "frame-title",
        group: Group::PageMarkup,
        ids: &[page::IFRAME_MISSING_TITLE],
        check: page::frame_title,
    },
    Detector {
        name: "focus-styles",
        group: Group::Stylesheet,
        ids: &[style::FOCUS_STYLES_MISSING],
        check: style::focus_styles,
    },
    Detector {
        name: "outline-removal",
        group: Group::Stylesheet,
        ids: &[style::OUTLINE_NONE],
        check: style::outline_removal,
    },
    Detector {
        name: "font-size",
        group: Group::Stylesheet,
        ids: &[style::FONT_SIZE_TOO_SMALL, style::FONT_SIZE_SMALL],
        check: style::font_size,
    },
    Detector {
        name: "touch-target",
        group: Group::Stylesheet,
        ids: &[style::TOUCH_TARGET_SMALL],
        check: style::touch_target,
    },
    Detector {
        name: "hidden-interactive",
        group: Group::Stylesheet,
        ids: &[style::INTERACTIVE_DISPLAY_NONE],
        check: style::hidden_interactive,
    },
    Detector {
        name: "transparent-text",
        group: Group::Stylesheet,
        ids: &[style::COLOR_TRANSPARENT],
        check: style::transparent_text,
    },
    Detector {
        name: "pointer-events",
        group: Group::Stylesheet,
        ids: &[style::POINTER_EVENTS_NONE],
        check: style::pointer_events,
    },
];

/// Detectors eligible for `kind`, grouped in execution order
pub fn detectors_for(kind: FileKind) -> impl Iterator<Item = &'static Detector> {
    Group::ORDER
        .into_iter()
        .filter(move |g| g.applies_to(kind))
        .flat_map(|g| CATALOG.iter().filter(move |d| d.group == g))
}

/// Run every eligible detector over `text`
pub fn run(text: &str, kind: FileKind) -> Vec<Violation> {
    let source = Source::new(text);
    detectors_for(kind)
        .flat_map(|d| (d.check)(&source))
        .collect()
}

/// Attribute fragment of a tag, tolerating `>` inside JSX `{...}` expressions
pub(crate) const TAG_ATTRS: &str = r"((?:[^>{}]|\{(?:[^{}]|\{[^{}]*\})*\})*)";

static ATTR_RE: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(
        r#"([A-Za-z_:@][-A-Za-z0-9_:.@]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|\{((?:[^{}]|\{[^{}]*\})*)\}|([^\s"'>=]+)))?"#,
    )
});

/// Attributes parsed from the raw attribute text of a tag
pub(crate) struct Attributes<'a> {
    pairs: Vec<(String, Option<&'a str>)>,
}

impl<'a> Attributes<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let pairs = ATTR_RE
            .captures(raw)
            .filter_map(|caps| {
                let name = caps.get(1)?.as_str().to_ascii_lowercase();
                let value = (2..=5).find_map(|i| caps.get(i)).map(|m| m.as_str());
                Some((name, value))
            })
            .collect();
        Self { pairs }
    }

    pub fn has(&self, name: &str) -> bool {
        self.pairs.iter().any(|(n, _)| n == name)
    }

    pub fn has_any(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.has(n))
    }

    /// Attribute value with surrounding quotes of JSX string expressions removed
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| *v)
            .map(|v| v.trim().trim_matches(|c| c == '"' || c == '\'' || c == '`'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    const MIXED_MARKUP: &str = r#"<html>
<head></head>
<body>
  <img src="a.png">
  <div onclick="go()">Go</div>
  <button></button>
  <input type="text">
  <input id="email">
  <a href="/x">click here</a>
  <iframe src="/embed"></iframe>
</body>
</html>"#;

    const MIXED_CSS: &str = r#"
.btn { outline: none; width: 30px; }
p { font-size: 8px; }
small { font-size: 11px; }
.nav-menu { display: none; }
.ghost { color: transparent; }
button { pointer-events: none; }
a { pointer-events: none; }
"#;

    #[test]
    fn test_detectors_for_groups() {
        let names = |kind| detectors_for(kind).map(|d| d.name).collect::<Vec<_>>();
        assert_eq!(names(FileKind::Script).len(), 5);
        assert_eq!(names(FileKind::MarkupComponent), names(FileKind::Script));
        assert_eq!(names(FileKind::PageMarkup).len(), 8);
        assert_eq!(names(FileKind::Stylesheet).len(), 7);
        assert!(names(FileKind::Unknown).is_empty());
    }

    #[test]
    fn test_markup_family_runs_before_page_markup() {
        let groups: Vec<_> = detectors_for(FileKind::PageMarkup).map(|d| d.group).collect();
        let first_page = groups.iter().position(|g| *g == Group::PageMarkup).unwrap();
        assert!(groups[..first_page].iter().all(|g| *g == Group::MarkupFamily));
    }

    #[test]
    fn test_unknown_kind_yields_nothing() {
        assert!(run(MIXED_MARKUP, FileKind::Unknown).is_empty());
    }

    #[test]
    fn test_every_violation_is_well_formed() {
        let mut all = run(MIXED_MARKUP, FileKind::PageMarkup);
        all.extend(run(MIXED_CSS, FileKind::Stylesheet));
        assert!(all.len() > 10);
        for v in &all {
            assert!(v.is_well_formed(), "malformed violation: {:?}", v);
        }
    }

    #[test]
    fn test_every_emitted_id_is_declared() {
        let mut all = run(MIXED_MARKUP, FileKind::PageMarkup);
        all.extend(run(MIXED_CSS, FileKind::Stylesheet));
        let declared: Vec<&str> = CATALOG.iter().flat_map(|d| d.ids.iter().copied()).collect();
        for v in &all {
            assert!(declared.contains(&v.id.as_str()), "undeclared id {}", v.id);
        }
    }

    #[test]
    fn test_detectors_are_idempotent() {
        for (text, kind) in [(MIXED_MARKUP, FileKind::PageMarkup), (MIXED_CSS, FileKind::Stylesheet)] {
            assert_eq!(run(text, kind), run(text, kind));
        }
    }

    #[test]
    fn test_html_page_order_is_insertion_order() {
        let ids: Vec<_> = run(MIXED_MARKUP, FileKind::PageMarkup)
            .into_iter()
            .map(|v| v.id)
            .collect();
        let img = ids.iter().position(|i| i == markup::IMG_MISSING_ALT).unwrap();
        let lang = ids.iter().position(|i| i == page::HTML_MISSING_LANG).unwrap();
        assert!(img < lang);
        assert_eq!(ids.last().map(String::as_str), Some(page::IFRAME_MISSING_TITLE));
    }

    #[test]
    fn test_binary_like_input_does_not_panic() {
        let junk = "\u{0}\u{1}<img\u{fffd}{{{{ }}}}<button>\u{7f}<<<>>>{ outline: none";
        for kind in [FileKind::PageMarkup, FileKind::Stylesheet, FileKind::MarkupComponent] {
            let _ = run(junk, kind);
        }
    }

    #[test]
    fn test_pointer_events_reported_once() {
        let count = run(MIXED_CSS, FileKind::Stylesheet)
            .iter()
            .filter(|v| v.id == style::POINTER_EVENTS_NONE)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_attributes_parse() {
        let attrs = Attributes::parse(r#" src="a.png" alt='' data-x=1 disabled onClick={() => go(1)}"#);
        assert_eq!(attrs.get("src"), Some("a.png"));
        assert_eq!(attrs.get("alt"), Some(""));
        assert_eq!(attrs.get("data-x"), Some("1"));
        assert!(attrs.has("disabled"));
        assert!(attrs.has("onclick"));
    }

    #[test]
    fn test_attributes_jsx_string_expression() {
        let attrs = Attributes::parse(r#" htmlFor={"email"} id={'name'}"#);
        assert_eq!(attrs.get("htmlfor"), Some("email"));
        assert_eq!(attrs.get("id"), Some("name"));
    }

    #[test]
    fn test_severity_mix() {
        let all = run(MIXED_CSS, FileKind::Stylesheet);
        assert!(all.iter().any(|v| v.severity == Severity::Error));
        assert!(all.iter().any(|v| v.severity == Severity::Warning));
    }
}
