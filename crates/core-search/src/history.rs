//! Search history shared by all three search kinds. Entries carry the kind's
//! tag so traversal only visits queries of the active kind.

use std::path::Path;

use core_state::History;

use crate::SearchKind;

#[derive(Debug, Default)]
pub struct SearchHistory {
    inner: History,
}

impl SearchHistory {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Self {
        Self {
            inner: History::load(path),
        }
    }

    pub fn push(&mut self, kind: SearchKind, query: &str) {
        if query.is_empty() {
            return;
        }
        self.inner.push(&format!("{}{}", kind.history_prefix(), query));
    }

    pub fn reset_cursor(&mut self) {
        self.inner.reset_cursor();
    }

    /// Older query of `kind` starting with `typed`, tag stripped.
    pub fn prev(&mut self, kind: SearchKind, typed: &str) -> Option<String> {
        let tag = kind.history_prefix();
        self.inner
            .prev(&format!("{tag}{typed}"))
            .map(|e| e[tag.len()..].to_string())
    }

    pub fn next(&mut self, kind: SearchKind, typed: &str) -> Option<String> {
        let tag = kind.history_prefix();
        self.inner
            .next(&format!("{tag}{typed}"))
            .map(|e| e[tag.len()..].to_string())
    }

    pub fn len(&self) -> usize {
        self.inner.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn traversal_is_scoped_to_kind() {
        let mut h = SearchHistory::in_memory();
        h.push(SearchKind::Literal, "foo");
        h.push(SearchKind::Regex, "fo+");
        h.push(SearchKind::Literal, "bar");
        assert_eq!(h.prev(SearchKind::Regex, ""), Some("fo+".to_string()));
        assert_eq!(h.prev(SearchKind::Regex, ""), None);
        h.reset_cursor();
        assert_eq!(h.prev(SearchKind::Literal, "f"), Some("foo".to_string()));
        assert_eq!(h.next(SearchKind::Literal, "f"), None);
    }

    #[test]
    fn persists_tagged_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search_history");
        let mut h = SearchHistory::load(&path);
        h.push(SearchKind::Fuzzy, "lidra");
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "F:lidra\n");
        assert_eq!(SearchHistory::load(&path).len(), 1);
    }
}
