#![allow(dead_code)] // Shared across integration tests; each binary uses a subset.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use core_actions::{
    Clipboard, CollabError, Collaborators, DispatchResult, Dispatcher, Formatter, Options, Vcs,
};
use core_events::{KeyCode, KeyEvent, KeyModifiers};
use core_syntax::{HighlightSpan, Language, NodeRange, SyntaxParser};
use core_text::{Position, TextEdit};

/// One `parse_sync` call as the parser saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCall {
    pub text: String,
    pub edit: Option<TextEdit>,
}

/// Parser double that records parse requests and answers node-stack
/// queries from a fixed list.
#[derive(Default)]
pub struct RecordingParser {
    pub calls: Mutex<Vec<ParseCall>>,
    pub nodes: Mutex<Vec<NodeRange>>,
}

impl RecordingParser {
    pub fn calls(&self) -> Vec<ParseCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_nodes(&self, nodes: Vec<NodeRange>) {
        *self.nodes.lock().unwrap() = nodes;
    }
}

impl SyntaxParser for RecordingParser {
    fn parse_sync(&self, _: &Path, _: Language, text: &str, edit: Option<&TextEdit>) -> bool {
        self.calls.lock().unwrap().push(ParseCall {
            text: text.to_string(),
            edit: edit.copied(),
        });
        true
    }

    fn highlights(&self, _: &Path, _: usize, _: usize) -> HashMap<usize, Vec<HighlightSpan>> {
        HashMap::new()
    }

    fn node_stack_at(&self, _: &Path, pos: Position) -> Vec<NodeRange> {
        self.nodes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.start <= pos && pos <= n.end)
            .copied()
            .collect()
    }
}

/// In-memory system clipboard.
#[derive(Default)]
pub struct MemClipboard {
    pub text: Mutex<Option<String>>,
}

impl Clipboard for MemClipboard {
    fn copy(&self, text: &str) -> Result<(), CollabError> {
        *self.text.lock().unwrap() = Some(text.to_string());
        Ok(())
    }

    fn paste(&self) -> Result<String, CollabError> {
        self.text
            .lock()
            .unwrap()
            .clone()
            .ok_or(CollabError::ClipboardUnavailable)
    }
}

/// Repository double. A checkout rewrites `file` with the branch's content.
pub struct FakeVcs {
    pub branches: Vec<String>,
    pub current: Mutex<String>,
    pub file: Option<PathBuf>,
    pub contents: HashMap<String, String>,
}

impl FakeVcs {
    pub fn new(branches: &[&str], current: &str) -> Self {
        Self {
            branches: branches.iter().map(|b| b.to_string()).collect(),
            current: Mutex::new(current.to_string()),
            file: None,
            contents: HashMap::new(),
        }
    }
}

impl Vcs for FakeVcs {
    fn current_branch(&self, _: &Path) -> Result<String, CollabError> {
        Ok(self.current.lock().unwrap().clone())
    }

    fn list_branches(&self, _: &Path) -> Result<(Vec<String>, Option<String>), CollabError> {
        Ok((self.branches.clone(), Some(self.current.lock().unwrap().clone())))
    }

    fn checkout(&self, _: &Path, branch: &str) -> Result<(), CollabError> {
        if !self.branches.iter().any(|b| b == branch) {
            return Err(CollabError::Git(format!("pathspec '{branch}' did not match")));
        }
        if let (Some(file), Some(text)) = (&self.file, self.contents.get(branch)) {
            std::fs::write(file, text)?;
        }
        *self.current.lock().unwrap() = branch.to_string();
        Ok(())
    }
}

/// Formatter returning a fixed text.
pub struct FixedFormatter(pub String);

impl Formatter for FixedFormatter {
    fn format(&self, _: Option<Language>, _: &str) -> Result<String, CollabError> {
        Ok(self.0.clone())
    }
}

pub fn editor(text: &str) -> Dispatcher {
    editor_with(text, Collaborators::inert())
}

pub fn editor_with(text: &str, collab: Collaborators) -> Dispatcher {
    let mut d = Dispatcher::new(Options::default(), collab);
    d.set_text(text);
    d
}

pub fn with_parser(parser: Arc<RecordingParser>) -> Collaborators {
    Collaborators {
        parser,
        ..Collaborators::inert()
    }
}

pub fn with_clipboard(clipboard: Arc<MemClipboard>) -> Collaborators {
    Collaborators {
        clipboard,
        ..Collaborators::inert()
    }
}

pub fn lines(d: &Dispatcher) -> Vec<String> {
    let buf = d.buffer();
    (0..buf.line_count()).map(|r| buf.line_string(r)).collect()
}

pub fn cursor(d: &Dispatcher) -> (usize, usize) {
    let c = d.buffer().cursor();
    (c.row, c.col)
}

pub fn set_cursor(d: &mut Dispatcher, row: usize, col: usize) {
    // Click maps screen cells to the cursor; gutter is 4 cells for short files.
    let gutter = d.line_numbers().gutter_width(d.buffer().line_count());
    d.handle_mouse(core_events::MouseEvent {
        kind: core_events::MouseEventKind::LeftDown,
        column: (gutter + col) as u16,
        row: row as u16,
        mods: KeyModifiers::empty(),
    });
}

/// Type each char as an unmodified key press.
pub fn typ(d: &mut Dispatcher, keys: &str) -> DispatchResult {
    let mut last = DispatchResult::clean();
    for c in keys.chars() {
        last = d.handle_key(KeyEvent::char(c));
    }
    last
}

pub fn press(d: &mut Dispatcher, code: KeyCode) -> DispatchResult {
    d.handle_key(KeyEvent::plain(code))
}

pub fn chord(d: &mut Dispatcher, mods: KeyModifiers, code: KeyCode) -> DispatchResult {
    d.handle_key(KeyEvent::new(code, mods))
}

/// `:` + command + Enter.
pub fn command(d: &mut Dispatcher, cmd: &str) -> DispatchResult {
    typ(d, ":");
    typ(d, cmd);
    press(d, KeyCode::Enter)
}
