//! Per-line overlay spans painted on top of syntax colors.
//!
//! Spans are line-local with half-open `[start_col, end_col)` ranges in code
//! point columns. Where spans overlap the attribute with the higher
//! [`StyleAttr::rank`] wins, independent of insertion order.

use core_search::SearchMatch;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleAttr {
    /// Any search match.
    Match,
    /// Query characters a fuzzy match actually hit.
    MatchedChar,
    /// The match navigation is sitting on.
    CurrentMatch,
    Selection,
}

impl StyleAttr {
    pub fn rank(self) -> u8 {
        match self {
            StyleAttr::Match => 1,
            StyleAttr::MatchedChar => 2,
            StyleAttr::CurrentMatch => 3,
            StyleAttr::Selection => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StyleSpan {
    pub start_col: usize,
    pub end_col: usize,
    pub attr: StyleAttr,
}

impl StyleSpan {
    pub fn contains(&self, col: usize) -> bool {
        self.start_col <= col && col < self.end_col
    }
}

/// Overlay spans for one line, rebuilt per painted row.
#[derive(Default, Debug)]
pub struct StyleLayer {
    spans: Vec<StyleSpan>,
}

impl StyleLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    pub fn push(&mut self, start_col: usize, end_col: usize, attr: StyleAttr) {
        if start_col < end_col {
            self.spans.push(StyleSpan {
                start_col,
                end_col,
                attr,
            });
        }
    }

    /// Add the spans `m` contributes to its row.
    pub fn push_match(&mut self, m: &SearchMatch, current: bool) {
        let attr = if current {
            StyleAttr::CurrentMatch
        } else {
            StyleAttr::Match
        };
        self.push(m.col, m.col + m.len, attr);
        // Literal and regex hits cover the whole span; only partial (fuzzy)
        // hits get per-character emphasis.
        if !current && m.matched_cols.len() < m.len {
            for &c in &m.matched_cols {
                self.push(c, c + 1, StyleAttr::MatchedChar);
            }
        }
    }

    pub fn attr_at(&self, col: usize) -> Option<StyleAttr> {
        self.spans
            .iter()
            .filter(|s| s.contains(col))
            .map(|s| s.attr)
            .max_by_key(|a| a.rank())
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_outranks_matches() {
        let mut layer = StyleLayer::new();
        layer.push(0, 4, StyleAttr::Selection);
        layer.push(2, 6, StyleAttr::CurrentMatch);
        assert_eq!(layer.attr_at(3), Some(StyleAttr::Selection));
        assert_eq!(layer.attr_at(4), Some(StyleAttr::CurrentMatch));
        assert_eq!(layer.attr_at(6), None);
    }

    #[test]
    fn empty_ranges_are_skipped() {
        let mut layer = StyleLayer::new();
        layer.push(3, 3, StyleAttr::Match);
        assert!(layer.is_empty());
    }

    #[test]
    fn fuzzy_hits_stand_out_inside_the_token() {
        let m = SearchMatch {
            row: 0,
            col: 2,
            len: 5,
            score: 0,
            matched_cols: vec![2, 5],
        };
        let mut layer = StyleLayer::new();
        layer.push_match(&m, false);
        assert_eq!(layer.attr_at(2), Some(StyleAttr::MatchedChar));
        assert_eq!(layer.attr_at(3), Some(StyleAttr::Match));
        assert_eq!(layer.attr_at(5), Some(StyleAttr::MatchedChar));
    }

    #[test]
    fn literal_hits_are_one_span() {
        let m = SearchMatch {
            row: 0,
            col: 1,
            len: 2,
            score: 0,
            matched_cols: vec![1, 2],
        };
        let mut layer = StyleLayer::new();
        layer.push_match(&m, false);
        assert_eq!(layer.attr_at(1), Some(StyleAttr::Match));
        assert_eq!(layer.attr_at(2), Some(StyleAttr::Match));
    }
}
