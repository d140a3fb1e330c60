mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::*;
use core_actions::{Collaborators, Dispatcher, Options};
use core_config::{LineNumbers, StatePaths};
use core_events::{KeyCode, KeyModifiers, MouseEvent, MouseEventKind};
use core_state::Mode;
use core_syntax::Language;
use pretty_assertions::assert_eq;

#[test]
fn line_numbers_cycle_and_set() {
    let mut d = editor("a");
    assert_eq!(d.line_numbers(), LineNumbers::Absolute);
    command(&mut d, "ln");
    assert_eq!(d.status(), Some("line numbers: rel"));
    command(&mut d, "ln off");
    assert_eq!(d.line_numbers(), LineNumbers::Off);
    assert_eq!(d.status(), Some("line numbers: off"));
    command(&mut d, "ln xyz");
    assert_eq!(d.status(), Some("unknown command: ln xyz"));
}

#[test]
fn write_keeps_crlf_and_clears_dirty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "one\r\ntwo\r\n").unwrap();
    let mut d = editor("");
    d.open(&path).unwrap();
    typ(&mut d, "d");
    assert!(d.is_dirty());

    command(&mut d, "w");
    assert!(!d.is_dirty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "ne\r\ntwo\r\n");
    let status = d.status().unwrap();
    assert!(status.ends_with("2L, 9B written"), "{status}");
}

#[test]
fn write_without_a_name_fails() {
    let mut d = editor("x");
    command(&mut d, "w");
    assert_eq!(d.status(), Some("no file name"));
    command(&mut d, "frob");
    assert_eq!(d.status(), Some("unknown command: frob"));
}

#[test]
fn write_quit_under_new_name_adopts_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.rs");
    let mut d = editor("fn x() {}");
    typ(&mut d, "d");
    let r = command(&mut d, &format!("wq {}", path.display()));
    assert!(r.quit);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "n x() {}");
    assert_eq!(d.path(), Some(path.as_path()));
    assert_eq!(d.language(), Some(Language::Rust));
    assert!(!d.is_dirty());
}

#[test]
fn open_reports_new_and_mixed_files() {
    let dir = tempfile::tempdir().unwrap();
    let fresh = dir.path().join("fresh.txt");
    let mut d = editor("");
    d.open(&fresh).unwrap();
    assert_eq!(d.status(), Some(format!("\"{}\" [new]", fresh.display()).as_str()));

    let mixed = dir.path().join("mixed.txt");
    std::fs::write(&mixed, "a\r\nb\nc\r\n").unwrap();
    d.open(&mixed).unwrap();
    assert_eq!(d.status(), Some("mixed line endings normalized"));
    assert_eq!(lines(&d), vec!["a", "b", "c"]);
}

#[test]
fn command_history_filters_by_typed_prefix() {
    let mut d = editor("a");
    command(&mut d, "ln");
    command(&mut d, "ln off");
    command(&mut d, "fmt");

    typ(&mut d, ":l");
    press(&mut d, KeyCode::Up);
    assert_eq!(d.prompt(), Some((":", "ln off")));
    press(&mut d, KeyCode::Up);
    assert_eq!(d.prompt(), Some((":", "ln")));
    press(&mut d, KeyCode::Up);
    assert_eq!(d.prompt(), Some((":", "ln")));
    press(&mut d, KeyCode::Down);
    assert_eq!(d.prompt(), Some((":", "ln off")));
    press(&mut d, KeyCode::Down);
    assert_eq!(d.prompt(), Some((":", "l")));
}

#[test]
fn prompt_cancels_on_escape_and_empty_backspace() {
    let mut d = editor("a");
    typ(&mut d, ":ab");
    press(&mut d, KeyCode::Esc);
    assert_eq!(d.mode(), Mode::Normal);
    assert_eq!(d.prompt(), None);

    typ(&mut d, ":x");
    press(&mut d, KeyCode::Backspace);
    assert_eq!(d.mode(), Mode::Command);
    press(&mut d, KeyCode::Backspace);
    assert_eq!(d.mode(), Mode::Normal);

    typ(&mut d, ":");
    chord(&mut d, KeyModifiers::CTRL, KeyCode::Char('c'));
    assert_eq!(d.mode(), Mode::Normal);
}

#[test]
fn literal_search_steps_and_wraps() {
    let mut d = editor("foo\nbar foo\nfoo");
    typ(&mut d, "n");
    assert_eq!(d.status(), Some("no search"));

    typ(&mut d, "/foo");
    assert_eq!(d.prompt(), Some(("/", "foo")));
    assert_eq!(d.search().matches().len(), 3);
    press(&mut d, KeyCode::Enter);
    assert_eq!(d.status(), Some("[1/3] foo"));
    assert_eq!(cursor(&d), (0, 0));

    typ(&mut d, "n");
    assert_eq!(cursor(&d), (1, 4));
    assert_eq!(d.status(), Some("[2/3] foo"));
    typ(&mut d, "nn");
    assert_eq!(cursor(&d), (0, 0));
    assert_eq!(d.status(), Some("[1/3] foo (wrapped)"));
    typ(&mut d, "N");
    assert_eq!(d.status(), Some("[3/3] foo (wrapped)"));
}

#[test]
fn backward_search_reverses_n() {
    let mut d = editor("foo\nbar foo\nfoo");
    set_cursor(&mut d, 1, 0);
    typ(&mut d, "?foo");
    assert_eq!(d.prompt(), Some(("?", "foo")));
    press(&mut d, KeyCode::Enter);
    assert_eq!(d.status(), Some("[2/3] foo"));
    typ(&mut d, "n");
    assert_eq!(d.status(), Some("[1/3] foo"));
    typ(&mut d, "n");
    assert_eq!(d.status(), Some("[3/3] foo (wrapped)"));
}

#[test]
fn search_escape_restores_cursor_and_clears() {
    let mut d = editor("abc\nxyz");
    set_cursor(&mut d, 0, 1);
    typ(&mut d, "/xyz");
    press(&mut d, KeyCode::Esc);
    assert_eq!(d.mode(), Mode::Normal);
    assert_eq!(cursor(&d), (0, 1));
    assert_eq!(d.search().query(), "");
}

#[test]
fn search_reports_no_matches_and_remembers_queries() {
    let mut d = editor("foo");
    typ(&mut d, "/foo");
    press(&mut d, KeyCode::Enter);
    typ(&mut d, "/zzz");
    press(&mut d, KeyCode::Enter);
    assert_eq!(d.status(), Some("no matches"));

    typ(&mut d, "/");
    press(&mut d, KeyCode::Up);
    assert_eq!(d.prompt(), Some(("/", "zzz")));
    press(&mut d, KeyCode::Up);
    assert_eq!(d.prompt(), Some(("/", "foo")));
    assert_eq!(d.search().matches().len(), 1);
}

#[test]
fn matches_follow_edits() {
    let mut d = editor("foo foo");
    typ(&mut d, "/foo");
    press(&mut d, KeyCode::Enter);
    assert_eq!(d.search().matches().len(), 2);
    typ(&mut d, "d");
    assert_eq!(d.search().matches().len(), 1);
}

fn branch_setup(dir: &std::path::Path) -> (Dispatcher, Arc<FakeVcs>, std::path::PathBuf) {
    let path = dir.join("main.txt");
    std::fs::write(&path, "on main\n").unwrap();
    let mut vcs = FakeVcs::new(&["dev", "main"], "main");
    vcs.file = Some(path.clone());
    vcs.contents.insert("dev".to_string(), "on dev\n".to_string());
    let vcs = Arc::new(vcs);
    let collab = Collaborators {
        vcs: vcs.clone(),
        ..Collaborators::inert()
    };
    let mut d = Dispatcher::new(Options::default(), collab);
    d.open(&path).unwrap();
    (d, vcs, path)
}

#[test]
fn branch_picker_checks_out_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let (mut d, _vcs, _) = branch_setup(dir.path());
    typ(&mut d, "d");

    typ(&mut d, " b");
    assert_eq!(d.mode(), Mode::BranchPicker);
    assert_eq!(d.picker().and_then(|p| p.selected_branch()), Some("main"));

    press(&mut d, KeyCode::Up);
    assert_eq!(d.picker().and_then(|p| p.selected_branch()), Some("dev"));
    let r = press(&mut d, KeyCode::Enter);
    assert!(r.buffer_replaced);
    assert_eq!(d.mode(), Mode::Normal);
    assert_eq!(d.status(), Some("switched to dev"));
    assert_eq!(d.branch(), Some("dev"));
    assert_eq!(lines(&d), vec!["on dev"]);
    assert!(!d.is_dirty());
    typ(&mut d, "u");
    assert_eq!(d.status(), Some("nothing to undo"));
}

#[test]
fn picking_the_current_branch_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (mut d, _vcs, _) = branch_setup(dir.path());
    typ(&mut d, " b");
    let r = press(&mut d, KeyCode::Enter);
    assert!(!r.buffer_replaced);
    assert_eq!(lines(&d), vec!["on main"]);

    typ(&mut d, " b");
    press(&mut d, KeyCode::Esc);
    assert_eq!(d.mode(), Mode::Normal);
    assert!(d.picker().is_none());
}

#[test]
fn git_branch_is_polled_at_most_once_per_interval() {
    let dir = tempfile::tempdir().unwrap();
    let (mut d, vcs, _) = branch_setup(dir.path());
    let t0 = Instant::now();
    d.tick(t0);
    assert_eq!(d.branch(), Some("main"));

    *vcs.current.lock().unwrap() = "dev".to_string();
    d.tick(t0 + Duration::from_millis(500));
    assert_eq!(d.branch(), Some("main"));
    assert!(d.tick(t0 + Duration::from_secs(3)));
    assert_eq!(d.branch(), Some("dev"));
}

#[test]
fn changelog_survives_reopen() {
    let state = tempfile::tempdir().unwrap();
    let docs = tempfile::tempdir().unwrap();
    let path = docs.path().join("notes.txt");
    std::fs::write(&path, "abc\n").unwrap();
    let opts = Options {
        paths: StatePaths::at(state.path()),
        ..Options::default()
    };

    let mut d = Dispatcher::new(opts.clone(), Collaborators::inert());
    d.open(&path).unwrap();
    typ(&mut d, "d");
    command(&mut d, "w");
    drop(d);

    let mut d = Dispatcher::new(opts.clone(), Collaborators::inert());
    d.open(&path).unwrap();
    assert_eq!(lines(&d), vec!["bc"]);
    assert!(!d.is_dirty());
    typ(&mut d, "u");
    assert_eq!(lines(&d), vec!["abc"]);
    assert!(d.is_dirty());

    // Command history was written through to the same state directory.
    let mut d = Dispatcher::new(opts, Collaborators::inert());
    typ(&mut d, ":");
    press(&mut d, KeyCode::Up);
    assert_eq!(d.prompt(), Some((":", "w")));
}

#[test]
fn click_maps_cells_and_clamps_rows() {
    let mut d = editor("ab\ncd");
    let gutter = d.line_numbers().gutter_width(2) as u16;
    d.handle_mouse(MouseEvent {
        kind: MouseEventKind::LeftDown,
        column: gutter + 1,
        row: 5,
        mods: KeyModifiers::empty(),
    });
    assert_eq!(cursor(&d), (1, 1));

    d.handle_resize(40, 10);
    assert_eq!(d.view().height, 8);
    assert_eq!(d.view().width, 40 - gutter as usize);
    d.handle_mouse(MouseEvent {
        kind: MouseEventKind::LeftDown,
        column: gutter,
        row: 9,
        mods: KeyModifiers::empty(),
    });
    assert_eq!(cursor(&d), (1, 1));
}
