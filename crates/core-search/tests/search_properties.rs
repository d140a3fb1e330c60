use core_search::{SearchEngine, SearchKind};
use core_text::TextBuffer;
use proptest::prelude::*;

fn kind() -> impl Strategy<Value = SearchKind> {
    prop_oneof![
        Just(SearchKind::Literal),
        Just(SearchKind::Fuzzy),
        Just(SearchKind::Regex),
    ]
}

proptest! {
    #[test]
    fn matches_are_sorted_and_inside_their_line(
        text in "[a-cA-C \n()]{0,60}",
        query in "[a-c]{1,3}",
        kind in kind(),
    ) {
        let buf = TextBuffer::from_text(&text);
        let mut engine = SearchEngine::new();
        let n = engine.set_query(&buf, &query, kind, 0).unwrap();
        let matches = engine.matches();
        prop_assert_eq!(n, matches.len());
        for pair in matches.windows(2) {
            prop_assert!((pair[0].row, pair[0].col) <= (pair[1].row, pair[1].col));
        }
        for m in matches {
            prop_assert!(m.len > 0);
            prop_assert!(m.col + m.len <= buf.line_len(m.row));
            prop_assert!(m.matched_cols.iter().all(|c| *c >= m.col && *c < m.col + m.len));
        }
    }

    #[test]
    fn stepping_forward_n_times_returns_to_start(
        text in "(ab ){1,8}\n(ab ){0,4}",
    ) {
        let buf = TextBuffer::from_text(&text);
        let mut engine = SearchEngine::new();
        let n = engine.set_query(&buf, "ab", SearchKind::Literal, 0).unwrap();
        let start = engine.current_index();
        for _ in 0..n {
            engine.step(true);
        }
        prop_assert_eq!(engine.current_index(), start);
    }
}
