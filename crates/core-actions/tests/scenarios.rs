mod common;

use std::sync::Arc;
use std::time::Instant;

use common::*;
use core_actions::Dispatcher;
use core_events::{KeyCode, KeyModifiers};
use core_search::SearchKind;
use core_state::Mode;
use core_text::{Point, Position};
use pretty_assertions::assert_eq;

#[test]
fn selection_delete_is_one_group_and_undo_restores_selection() {
    let mut d = editor("hello world");
    for _ in 0..5 {
        chord(&mut d, KeyModifiers::SHIFT, KeyCode::Right);
    }
    assert_eq!(
        d.buffer().selection_range(),
        Some((Position::new(0, 0), Position::new(0, 5)))
    );

    typ(&mut d, "d");
    assert_eq!(lines(&d), vec![" world"]);
    assert_eq!(cursor(&d), (0, 0));
    assert_eq!(d.buffer().selection_range(), None);

    typ(&mut d, "u");
    assert_eq!(lines(&d), vec!["hello world"]);
    assert_eq!(
        d.buffer().selection_range(),
        Some((Position::new(0, 0), Position::new(0, 5)))
    );
}

#[test]
fn line_move_undo_puts_cursor_back() {
    let mut d = editor("a\nb\nc");
    set_cursor(&mut d, 1, 0);
    chord(&mut d, KeyModifiers::ALT, KeyCode::Up);
    assert_eq!(lines(&d), vec!["b", "a", "c"]);
    assert_eq!(cursor(&d), (0, 0));

    typ(&mut d, "u");
    assert_eq!(lines(&d), vec!["a", "b", "c"]);
    assert_eq!(cursor(&d), (1, 0));
}

#[test]
fn fuzzy_chunk_match_covers_the_token() {
    let mut d = editor("drawLineWithGutter");
    chord(&mut d, KeyModifiers::ALT, KeyCode::Char('/'));
    assert_eq!(d.mode(), Mode::Search);
    typ(&mut d, "lidra");

    let matches = d.search().matches();
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].row, matches[0].col, matches[0].len), (0, 0, 18));
    assert_eq!(matches[0].matched_cols, vec![0, 1, 2, 4, 5]);
    assert_eq!(d.search().kind(), SearchKind::Fuzzy);

    press(&mut d, KeyCode::Enter);
    assert_eq!(d.mode(), Mode::Normal);
    assert_eq!(d.status(), Some("[1/1] lidra"));
}

#[test]
fn bad_regex_reports_and_skips_history() {
    let mut d = editor("abc [x]");
    chord(&mut d, KeyModifiers::ALT, KeyCode::Char('e'));
    typ(&mut d, "[");
    assert!(d.search().matches().is_empty());
    assert!(d.status().unwrap().starts_with("regex error:"));

    press(&mut d, KeyCode::Enter);
    assert_eq!(d.mode(), Mode::Normal);
    assert!(d.search().matches().is_empty());
    assert!(d.status().unwrap().starts_with("regex error:"));

    // Nothing was saved: history recall in a fresh regex prompt finds nothing.
    chord(&mut d, KeyModifiers::ALT, KeyCode::Char('e'));
    press(&mut d, KeyCode::Up);
    assert_eq!(d.prompt(), Some(("regex/", "")));
}

#[test]
fn undo_forces_a_full_reparse() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scratch.go");
    let parser = Arc::new(RecordingParser::default());
    let mut d = Dispatcher::new(Default::default(), with_parser(parser.clone()));
    d.open(&path).unwrap();
    assert_eq!(lines(&d), vec![""]);

    d.tick(Instant::now());
    assert_eq!(parser.calls().len(), 1);
    assert_eq!(parser.calls()[0].edit, None);

    typ(&mut d, "ix");
    d.tick(Instant::now());
    let calls = parser.calls();
    assert_eq!(calls.len(), 2);
    let edit = calls[1].edit.expect("typing one char is incremental");
    assert_eq!((edit.start_byte, edit.old_end_byte, edit.new_end_byte), (0, 0, 1));
    assert_eq!(edit.start_point, Point { row: 0, column: 0 });
    assert_eq!(edit.old_end_point, Point { row: 0, column: 0 });
    assert_eq!(edit.new_end_point, Point { row: 0, column: 1 });
    assert_eq!(calls[1].text, "x");

    press(&mut d, KeyCode::Esc);
    typ(&mut d, "u");
    d.tick(Instant::now());
    let calls = parser.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2].edit, None);
    assert_eq!(calls[2].text, "");
}

#[test]
fn quit_refuses_unsaved_changes_until_forced() {
    let mut d = editor("text");
    typ(&mut d, "d");
    assert_eq!(lines(&d), vec!["ext"]);
    assert!(d.is_dirty());

    let r = command(&mut d, "q");
    assert!(!r.quit);
    assert_eq!(d.status(), Some("unsaved changes (use :q!)"));
    assert_eq!(d.mode(), Mode::Normal);

    let r = command(&mut d, "q!");
    assert!(r.quit);
}
