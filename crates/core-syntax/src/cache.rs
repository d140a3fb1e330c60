//! Span map for the visible row range and the per-tick refresh rule.
//!
//! Each tick:
//! 1. if the change tick advanced, the pending edit is taken from the buffer
//!    and forwarded to the parser (incremental when it is a single delta);
//! 2. if the change tick advanced or the visible range moved, spans are
//!    re-requested for the new range; otherwise the cached map is reused.
//!
//! A parse the parser rejects leaves the buffer marked for a full reparse
//! and the cache stale, so the following tick tries again.
//!
//! Documents larger than the configured threshold never highlight.

use std::collections::HashMap;
use std::path::Path;

use core_text::TextBuffer;
use tracing::{debug, trace};

use crate::{HighlightKind, HighlightSpan, Language, SyntaxParser};

pub const DEFAULT_LARGE_FILE_THRESHOLD: usize = 8 * 1024 * 1024;

/// What a tick did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub parsed: bool,
    pub incremental: bool,
    pub refreshed: bool,
}

/// Document identity handed to [`HighlightCache::tick`].
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    pub path: Option<&'a Path>,
    pub language: Option<Language>,
}

#[derive(Debug)]
pub struct HighlightCache {
    spans: HashMap<usize, Vec<HighlightSpan>>,
    range: Option<(usize, usize)>,
    last_tick: Option<u64>,
    disabled: bool,
    threshold: usize,
}

impl Default for HighlightCache {
    fn default() -> Self {
        Self::new(DEFAULT_LARGE_FILE_THRESHOLD)
    }
}

impl HighlightCache {
    pub fn new(threshold: usize) -> Self {
        Self {
            spans: HashMap::new(),
            range: None,
            last_tick: None,
            disabled: false,
            threshold,
        }
    }

    /// Forget everything (buffer replaced). `size` decides the large-file switch.
    pub fn reset(&mut self, size: usize) {
        self.spans.clear();
        self.range = None;
        self.last_tick = None;
        self.disabled = size > self.threshold;
        if self.disabled {
            debug!(
                target: "syntax.cache",
                size,
                threshold = self.threshold,
                "highlighting disabled"
            );
        }
    }

    /// Drop cached spans so the next tick re-requests them.
    pub fn invalidate(&mut self) {
        self.range = None;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn tick(
        &mut self,
        parser: &dyn SyntaxParser,
        source: Source<'_>,
        change_tick: u64,
        visible: (usize, usize),
        buf: &mut TextBuffer,
    ) -> TickOutcome {
        let changed = self.last_tick != Some(change_tick);
        let mut outcome = TickOutcome::default();
        let pending = if changed {
            Some(buf.take_pending_edit())
        } else {
            None
        };
        self.last_tick = Some(change_tick);
        let (Some(path), Some(language)) = (source.path, source.language) else {
            return outcome;
        };
        if self.disabled {
            return outcome;
        }
        let mut failed = false;
        if let Some(pending) = pending {
            let edit = pending.edit();
            let ok = parser.parse_sync(path, language, &buf.to_text(), edit);
            outcome.parsed = true;
            outcome.incremental = edit.is_some();
            failed = !ok;
            trace!(
                target: "syntax.cache",
                ok,
                incremental = outcome.incremental,
                change_tick,
                "parse"
            );
        }
        if changed || self.range != Some(visible) {
            self.spans = parser.highlights(path, visible.0, visible.1);
            self.range = Some(visible);
            outcome.refreshed = true;
        }
        if failed {
            // The parser's tree missed this change: retry in full next tick.
            debug!(target: "syntax.cache", change_tick, "parse failed, full reparse scheduled");
            buf.invalidate_edit();
            self.last_tick = None;
            self.range = None;
        }
        outcome
    }

    pub fn line_spans(&self, row: usize) -> &[HighlightSpan] {
        self.spans.get(&row).map_or(&[], |v| v.as_slice())
    }

    /// Winning kind at `(row, col)` by priority.
    pub fn style_at(&self, row: usize, col: usize) -> Option<HighlightKind> {
        self.line_spans(row)
            .iter()
            .filter(|s| s.start_col <= col && col < s.end_col)
            .max_by_key(|s| s.kind.priority())
            .map(|s| s.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeRange;
    use core_text::{Position, TextEdit};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Fake {
        parses: Mutex<Vec<Option<TextEdit>>>,
        requests: Mutex<Vec<(usize, usize)>>,
        spans: Vec<HighlightSpan>,
        /// 1-based parse call that reports failure.
        fail_call: Option<usize>,
    }

    impl Fake {
        fn edits(&self) -> Vec<Option<TextEdit>> {
            self.parses.lock().unwrap().clone()
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl SyntaxParser for Fake {
        fn parse_sync(&self, _: &Path, _: Language, _: &str, edit: Option<&TextEdit>) -> bool {
            let mut parses = self.parses.lock().unwrap();
            parses.push(edit.copied());
            self.fail_call != Some(parses.len())
        }

        fn highlights(
            &self,
            _: &Path,
            start: usize,
            end: usize,
        ) -> HashMap<usize, Vec<HighlightSpan>> {
            self.requests.lock().unwrap().push((start, end));
            HashMap::from([(0, self.spans.clone())])
        }

        fn node_stack_at(&self, _: &Path, _: Position) -> Vec<NodeRange> {
            Vec::new()
        }
    }

    fn source(path: &Path) -> Source<'_> {
        Source {
            path: Some(path),
            language: Some(Language::Rust),
        }
    }

    fn span(start_col: usize, end_col: usize, kind: HighlightKind) -> HighlightSpan {
        HighlightSpan {
            start_col,
            end_col,
            kind,
        }
    }

    #[test]
    fn reuses_spans_until_tick_or_range_changes() {
        let fake = Fake::default();
        let path = Path::new("x.rs");
        let mut buf = TextBuffer::from_text("fn main() {}");
        let mut cache = HighlightCache::default();
        assert!(cache.tick(&fake, source(path), 0, (0, 10), &mut buf).refreshed);
        assert!(!cache.tick(&fake, source(path), 0, (0, 10), &mut buf).refreshed);
        assert!(cache.tick(&fake, source(path), 0, (1, 11), &mut buf).refreshed);
        assert_eq!(fake.edits().len(), 1);

        buf.insert_rune(Position::new(0, 0), ' ');
        let out = cache.tick(&fake, source(path), 1, (1, 11), &mut buf);
        assert!(out.parsed && out.incremental && out.refreshed);
        assert_eq!(fake.request_count(), 3);
    }

    #[test]
    fn failed_parse_retries_in_full_on_the_next_tick() {
        let fake = Fake {
            fail_call: Some(2),
            ..Fake::default()
        };
        let path = Path::new("x.rs");
        let mut buf = TextBuffer::from_text("fn main() {}");
        let mut cache = HighlightCache::default();
        cache.tick(&fake, source(path), 0, (0, 10), &mut buf);

        buf.insert_rune(Position::new(0, 0), ' ');
        let out = cache.tick(&fake, source(path), 1, (0, 10), &mut buf);
        assert!(out.parsed && out.incremental);
        assert_eq!(fake.request_count(), 2);

        // No new edit: the idle tick re-parses from scratch and re-requests spans.
        let out = cache.tick(&fake, source(path), 1, (0, 10), &mut buf);
        assert!(out.parsed && !out.incremental && out.refreshed);
        assert_eq!(fake.request_count(), 3);
        assert_eq!(fake.edits()[2], None);

        // Recovered: idle ticks are quiet again and edits go incremental.
        assert_eq!(
            cache.tick(&fake, source(path), 1, (0, 10), &mut buf),
            TickOutcome::default()
        );
        buf.insert_rune(Position::new(0, 0), ' ');
        let out = cache.tick(&fake, source(path), 2, (0, 10), &mut buf);
        assert!(out.incremental);
    }

    #[test]
    fn edit_after_failed_parse_is_not_sent_as_a_delta() {
        let fake = Fake {
            fail_call: Some(2),
            ..Fake::default()
        };
        let path = Path::new("x.rs");
        let mut buf = TextBuffer::from_text("fn main() {}");
        let mut cache = HighlightCache::default();
        cache.tick(&fake, source(path), 0, (0, 10), &mut buf);
        buf.insert_rune(Position::new(0, 0), ' ');
        cache.tick(&fake, source(path), 1, (0, 10), &mut buf);

        buf.insert_rune(Position::new(0, 1), ' ');
        let out = cache.tick(&fake, source(path), 2, (0, 10), &mut buf);
        assert!(out.parsed && !out.incremental);
        assert_eq!(fake.edits().last().copied().flatten(), None);
    }

    #[test]
    fn overlapping_spans_resolve_by_priority() {
        let fake = Fake {
            spans: vec![
                span(0, 10, HighlightKind::Variable),
                span(2, 4, HighlightKind::Comment),
                span(3, 6, HighlightKind::Keyword),
            ],
            ..Fake::default()
        };
        let mut buf = TextBuffer::new();
        let mut cache = HighlightCache::default();
        cache.tick(&fake, source(Path::new("a.rs")), 0, (0, 1), &mut buf);
        assert_eq!(cache.style_at(0, 1), Some(HighlightKind::Variable));
        assert_eq!(cache.style_at(0, 3), Some(HighlightKind::Comment));
        assert_eq!(cache.style_at(0, 5), Some(HighlightKind::Keyword));
        assert_eq!(cache.style_at(0, 10), None);
    }

    #[test]
    fn large_files_stay_empty() {
        let fake = Fake {
            spans: vec![span(0, 1, HighlightKind::Keyword)],
            ..Fake::default()
        };
        let mut buf = TextBuffer::from_text("0123456789");
        let mut cache = HighlightCache::new(4);
        cache.reset(buf.len_bytes());
        assert!(cache.is_disabled());
        let out = cache.tick(&fake, source(Path::new("a.rs")), 0, (0, 1), &mut buf);
        assert_eq!(out, TickOutcome::default());
        assert!(cache.line_spans(0).is_empty());
        assert!(fake.edits().is_empty());
    }
}
