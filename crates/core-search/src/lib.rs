//! Search over the document: literal, fuzzy and regex strategies producing a
//! sorted match list with wrap-around navigation.

use core_text::TextBuffer;
use regex::RegexBuilder;
use tracing::debug;

mod fuzzy;
pub mod history;

pub use history::SearchHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchKind {
    #[default]
    Literal,
    Fuzzy,
    Regex,
}

impl SearchKind {
    /// Tag stored in front of history entries.
    pub fn history_prefix(self) -> &'static str {
        match self {
            SearchKind::Literal => "/: ",
            SearchKind::Fuzzy => "F:",
            SearchKind::Regex => "E:",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SearchKind::Literal => "search",
            SearchKind::Fuzzy => "fuzzy",
            SearchKind::Regex => "regex",
        }
    }
}

/// One match. `matched_cols` are line columns of the highlighted letters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub row: usize,
    pub col: usize,
    pub len: usize,
    pub score: i32,
    pub matched_cols: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("regex error: {0}")]
    Regex(String),
}

fn literal_line(row: usize, line: &[char], query: &[char], out: &mut Vec<SearchMatch>) {
    if query.is_empty() || query.len() > line.len() {
        return;
    }
    for col in 0..=line.len() - query.len() {
        let hit = line[col..col + query.len()]
            .iter()
            .zip(query)
            .all(|(a, b)| fuzzy::eq_fold(*a, *b));
        if hit {
            out.push(SearchMatch {
                row,
                col,
                len: query.len(),
                score: fuzzy::SCORE_EXACT,
                matched_cols: (col..col + query.len()).collect(),
            });
        }
    }
}

/// Case-insensitive substring matches, overlapping allowed.
pub fn literal_matches(buf: &TextBuffer, query: &str) -> Vec<SearchMatch> {
    let q: Vec<char> = query.chars().collect();
    let mut out = Vec::new();
    for row in 0..buf.line_count() {
        literal_line(row, buf.line(row).unwrap_or(&[]), &q, &mut out);
    }
    out
}

/// Case-insensitive regex matches. Empty matches are dropped.
pub fn regex_matches(buf: &TextBuffer, pattern: &str) -> Result<Vec<SearchMatch>, SearchError> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| SearchError::Regex(e.to_string()))?;
    let mut out = Vec::new();
    for row in 0..buf.line_count() {
        let line = buf.line_string(row);
        for m in re.find_iter(&line) {
            if m.start() == m.end() {
                continue;
            }
            let col = line[..m.start()].chars().count();
            let len = m.as_str().chars().count();
            out.push(SearchMatch {
                row,
                col,
                len,
                score: 0,
                matched_cols: (col..col + len).collect(),
            });
        }
    }
    Ok(out)
}

/// Exact hits first, then sequential/chunk matches on the remaining tokens.
pub fn fuzzy_matches(buf: &TextBuffer, query: &str) -> Vec<SearchMatch> {
    let q: Vec<char> = query.chars().filter(|c| !c.is_whitespace()).collect();
    let mut out = Vec::new();
    if q.is_empty() {
        return out;
    }
    for row in 0..buf.line_count() {
        let line = buf.line(row).unwrap_or(&[]);
        let first = out.len();
        literal_line(row, line, &q, &mut out);
        let exact: Vec<(usize, usize)> = out[first..]
            .iter()
            .map(|m| (m.col, m.col + m.len))
            .collect();
        let text: String = line.iter().collect();
        for token in fuzzy::tokens(&text) {
            let (ts, te) = (token.start, token.start + token.len);
            if exact.iter().any(|&(s, e)| s < te && ts < e) {
                continue;
            }
            if let Some((score, cols)) = fuzzy::match_token(&line[ts..te], &q) {
                out.push(SearchMatch {
                    row,
                    col: ts,
                    len: token.len,
                    score,
                    matched_cols: cols.iter().map(|c| ts + c).collect(),
                });
            }
        }
    }
    out
}

/// Match list plus navigation state for the active query.
#[derive(Debug, Default)]
pub struct SearchEngine {
    query: String,
    kind: SearchKind,
    matches: Vec<SearchMatch>,
    current: Option<usize>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn current(&self) -> Option<&SearchMatch> {
        self.current.and_then(|i| self.matches.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.current = None;
    }

    /// Install a query and compute matches. The current match is the first
    /// one at or below `cursor_row`, wrapping to the first overall.
    pub fn set_query(
        &mut self,
        buf: &TextBuffer,
        query: &str,
        kind: SearchKind,
        cursor_row: usize,
    ) -> Result<usize, SearchError> {
        self.query = query.to_string();
        self.kind = kind;
        let r = self.recompute(buf);
        self.seek(cursor_row, true);
        r
    }

    /// Make the first match at or below `row` current (forward), or the last
    /// one at or above it (backward), wrapping when there is none.
    pub fn seek(&mut self, row: usize, forward: bool) {
        if self.matches.is_empty() {
            self.current = None;
            return;
        }
        let idx = if forward {
            self.matches.iter().position(|m| m.row >= row).unwrap_or(0)
        } else {
            self.matches
                .iter()
                .rposition(|m| m.row <= row)
                .unwrap_or(self.matches.len() - 1)
        };
        self.current = Some(idx);
    }

    /// Recompute for the current query (buffer changed). Keeps the current
    /// index when still in range.
    pub fn recompute(&mut self, buf: &TextBuffer) -> Result<usize, SearchError> {
        let result = match self.kind {
            _ if self.query.is_empty() => Ok(Vec::new()),
            SearchKind::Literal => Ok(literal_matches(buf, &self.query)),
            SearchKind::Fuzzy => Ok(fuzzy_matches(buf, &self.query)),
            SearchKind::Regex => regex_matches(buf, &self.query),
        };
        match result {
            Ok(mut matches) => {
                matches.sort_by_key(|m| (m.row, m.col));
                self.matches = matches;
                self.current = self.current.filter(|i| *i < self.matches.len());
                debug!(target: "search", kind = self.kind.label(), matches = self.matches.len(), "recompute");
                Ok(self.matches.len())
            }
            Err(e) => {
                self.matches.clear();
                self.current = None;
                Err(e)
            }
        }
    }

    /// Advance (or retreat when `forward` is false). Returns the match and
    /// whether navigation wrapped.
    pub fn step(&mut self, forward: bool) -> Option<(&SearchMatch, bool)> {
        let n = self.matches.len();
        if n == 0 {
            return None;
        }
        let (next, wrapped) = match (self.current, forward) {
            (None, true) => (0, false),
            (None, false) => (n - 1, false),
            (Some(i), true) if i + 1 >= n => (0, true),
            (Some(i), true) => (i + 1, false),
            (Some(0), false) => (n - 1, true),
            (Some(i), false) => (i - 1, false),
        };
        self.current = Some(next);
        Some((&self.matches[next], wrapped))
    }

    /// `[i/N] query`, 1-based.
    pub fn status(&self) -> String {
        match self.current {
            Some(i) => format!("[{}/{}] {}", i + 1, self.matches.len(), self.query),
            None => format!("[0/{}] {}", self.matches.len(), self.query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn literal_is_case_insensitive_and_overlapping() {
        let buf = TextBuffer::from_text("aAa\nxx");
        let m = literal_matches(&buf, "aa");
        assert_eq!(m.iter().map(|m| (m.row, m.col)).collect::<Vec<_>>(), vec![(0, 0), (0, 1)]);
        assert!(literal_matches(&buf, "").is_empty());
    }

    #[test]
    fn regex_columns_are_code_points() {
        let buf = TextBuffer::from_text("héllo wörld");
        let m = regex_matches(&buf, "W.RLD").unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!((m[0].col, m[0].len), (6, 5));
    }

    #[test]
    fn regex_drops_empty_matches() {
        let buf = TextBuffer::from_text("abc");
        assert!(regex_matches(&buf, "x*").unwrap().is_empty());
    }

    #[test]
    fn bad_regex_is_an_error_with_status_text() {
        let buf = TextBuffer::from_text("abc");
        let err = regex_matches(&buf, "[").unwrap_err();
        assert!(err.to_string().starts_with("regex error:"));
    }

    #[test]
    fn fuzzy_exact_hit_hides_token() {
        let buf = TextBuffer::from_text("draw drawLine");
        let m = fuzzy_matches(&buf, "draw");
        // Both tokens contain an exact hit; no extra fuzzy matches.
        assert_eq!(m.len(), 2);
        assert!(m.iter().all(|m| m.len == 4));
    }

    #[test]
    fn current_starts_at_cursor_row_and_wraps() {
        let buf = TextBuffer::from_text("foo\nbar\nfoo\nfoo");
        let mut e = SearchEngine::new();
        assert_eq!(e.set_query(&buf, "foo", SearchKind::Literal, 1), Ok(3));
        assert_eq!(e.current().map(|m| m.row), Some(2));
        assert_eq!(e.status(), "[2/3] foo");
        let (m, wrapped) = e.step(true).unwrap();
        assert_eq!((m.row, wrapped), (3, false));
        let (m, wrapped) = e.step(true).unwrap();
        assert_eq!((m.row, wrapped), (0, true));
        let (m, wrapped) = e.step(false).unwrap();
        assert_eq!((m.row, wrapped), (3, true));
    }

    #[test]
    fn backward_seek_picks_last_at_or_above() {
        let buf = TextBuffer::from_text("foo\nfoo\nbar\nfoo");
        let mut e = SearchEngine::new();
        e.set_query(&buf, "foo", SearchKind::Literal, 2).unwrap();
        e.seek(2, false);
        assert_eq!(e.current().map(|m| m.row), Some(1));
        e.seek(0, true);
        assert_eq!(e.status(), "[1/3] foo");
    }

    #[test]
    fn recompute_follows_buffer_changes() {
        let mut buf = TextBuffer::from_text("ab");
        let mut e = SearchEngine::new();
        e.set_query(&buf, "b", SearchKind::Literal, 0).unwrap();
        buf.insert_rune(core_text::Position::new(0, 0), 'b');
        assert_eq!(e.recompute(&buf), Ok(2));
    }
}
