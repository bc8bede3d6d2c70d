use crate::types::Location;
use regex::{CaptureMatches, Captures, Regex};

/// Source text with a line index for resolving offsets to locations
pub struct Source<'t> {
    text: &'t str,
    line_starts: Vec<usize>,
}

impl<'t> Source<'t> {
    pub fn new(text: &'t str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    pub fn text(&self) -> &'t str {
        self.text
    }

    /// Resolve a byte offset to a 1-based line and column
    pub fn location(&self, offset: usize) -> Location {
        let offset = offset.min(self.text.len());
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[idx];
        let column = self
            .text
            .get(line_start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(0)
            + 1;
        Location {
            line: idx + 1,
            column,
        }
    }

    /// Text of the line containing `offset`, without the trailing newline
    pub fn line_at(&self, offset: usize) -> &'t str {
        let line = self.location(offset).line;
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        self.text.get(start..end).unwrap_or("").trim_end_matches('\r')
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

/// A compiled detector pattern
///
/// [`Pattern::matches`] yields [`Hit`]s lazily; calling it again restarts
/// from the top of the source.
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern. Patterns are literals owned by detectors, so an
    /// invalid one is a programming error.
    pub fn new(pattern: &str) -> Self {
        Self {
            regex: Regex::new(pattern).expect("valid detector pattern"),
        }
    }

    pub fn matches<'s>(&'s self, source: &'s Source<'s>) -> Matches<'s> {
        Matches {
            inner: self.regex.captures_iter(source.text()),
            source,
        }
    }

    /// Whether the pattern matches anywhere in `text`
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Iterate captures over an arbitrary slice (e.g. a rule block)
    pub fn captures<'p, 'h>(&'p self, text: &'h str) -> CaptureMatches<'p, 'h> {
        self.regex.captures_iter(text)
    }

}

/// Lazy sequence of hits for one pattern over one source
pub struct Matches<'s> {
    inner: CaptureMatches<'s, 's>,
    source: &'s Source<'s>,
}

impl<'s> Iterator for Matches<'s> {
    type Item = Hit<'s>;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.inner.next()?;
        Some(Hit {
            caps,
            source: self.source,
        })
    }
}

/// One pattern match with its captured groups
pub struct Hit<'s> {
    caps: Captures<'s>,
    source: &'s Source<'s>,
}

impl<'s> Hit<'s> {
    pub fn start(&self) -> usize {
        self.caps.get(0).map(|m| m.start()).unwrap_or(0)
    }

    pub fn end(&self) -> usize {
        self.caps.get(0).map(|m| m.end()).unwrap_or(0)
    }

    pub fn as_str(&self) -> &'s str {
        self.caps.get(0).map(|m| m.as_str()).unwrap_or("")
    }

    /// Captured group `i`, if it participated in the match
    pub fn group(&self, i: usize) -> Option<&'s str> {
        self.caps.get(i).map(|m| m.as_str())
    }

    /// Start offset of captured group `i`
    pub fn group_start(&self, i: usize) -> Option<usize> {
        self.caps.get(i).map(|m| m.start())
    }

    pub fn location(&self) -> Location {
        self.source.location(self.start())
    }
}
