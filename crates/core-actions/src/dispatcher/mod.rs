//! Dispatcher: owns the document and every piece of editor state, and turns
//! key, mouse and resize events into edits, motions and mode changes.
//!
//! Sub-modules split the work by concern:
//! * `mode`    - pending keys, menus, mode entry
//! * `motion`  - cursor movement and selection shaping
//! * `edit`    - buffer mutation through the undo journal
//! * `undo`    - undo / redo
//! * `command` - the `:` prompt and command execution
//! * `search`  - the search prompts and match navigation
//! * `picker`  - the branch picker
//!
//! All buffer mutations go through [`EditAction`] values that are applied and
//! then recorded, so undo, the changelog and incremental reparsing see the
//! same edits.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use core_config::{Config, LineNumbers, StatePaths};
use core_events::{InputEvent, KeyEvent, MouseEvent, MouseEventKind};
use core_keymap::{Keymap, MenuKind};
use core_search::{SearchEngine, SearchHistory, SearchKind};
use core_state::{
    EditAction, History, LineEnding, Mode, PromptLine, StatusLine, UndoJournal, View,
    changelog_path,
};
use core_syntax::{HighlightCache, Language, Source};
use core_text::{Position, Selection, TextBuffer, width};
use tracing::{debug, info, trace, warn};

use crate::collab::Collaborators;
use crate::io_ops::{self, OpenedFile};
use crate::{Action, Motion};

mod command;
mod command_parser;
mod edit;
mod mode;
mod motion;
mod picker;
mod search;
mod undo;

pub use command::CommandError;
pub use command_parser::{CommandParser, ParsedCommand};
pub use mode::Pending;
pub use picker::BranchPicker;

use mode::ModeMachine;

/// Rows the mouse wheel scrolls per notch.
const WHEEL_STEP: isize = 3;

/// Result of handling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResult {
    pub dirty: bool,
    pub quit: bool,
    /// The whole document was replaced (branch switch); render caches keyed
    /// on line content are stale.
    pub buffer_replaced: bool,
}

impl DispatchResult {
    pub fn dirty() -> Self {
        Self {
            dirty: true,
            quit: false,
            buffer_replaced: false,
        }
    }
    pub fn clean() -> Self {
        Self {
            dirty: false,
            quit: false,
            buffer_replaced: false,
        }
    }
    pub fn quit() -> Self {
        Self {
            dirty: true,
            quit: true,
            buffer_replaced: false,
        }
    }
    pub fn buffer_replaced() -> Self {
        Self {
            dirty: true,
            quit: false,
            buffer_replaced: true,
        }
    }
}

/// Settings the dispatcher reads while running.
#[derive(Debug, Clone)]
pub struct Options {
    pub indent_unit: String,
    pub line_numbers: LineNumbers,
    pub large_file_threshold: usize,
    pub scroll_margin: usize,
    pub git_poll: Duration,
    pub keymap: Keymap,
    pub paths: StatePaths,
}

impl Options {
    pub fn from_config(config: &Config, paths: StatePaths) -> Self {
        let editor = &config.file.editor;
        Self {
            indent_unit: editor.indent_unit.clone(),
            line_numbers: editor.line_numbers,
            large_file_threshold: editor.large_file_threshold,
            scroll_margin: usize::from(editor.scroll_margin),
            git_poll: Duration::from_secs(config.file.runtime.git_poll_secs),
            keymap: Keymap::with_overrides(&config.file.keys.normal, &config.file.keys.insert),
            paths,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::from_config(&Config::default(), StatePaths::disabled())
    }
}

/// File identity and the on-disk shape the buffer is written back in.
#[derive(Debug, Default)]
struct Document {
    path: Option<PathBuf>,
    language: Option<Language>,
    line_ending: LineEnding,
    trailing_newline: bool,
    /// Lines as last read or written; `restore_line` copies from here.
    saved_lines: Vec<String>,
}

pub struct Dispatcher {
    buf: TextBuffer,
    journal: UndoJournal,
    highlights: HighlightCache,
    search: SearchEngine,
    modes: ModeMachine,
    doc: Document,
    view: View,
    status: StatusLine,
    prompt: PromptLine,
    command_history: History,
    search_history: SearchHistory,
    /// Text typed before history traversal started; filters entries.
    history_seed: Option<String>,
    search_kind: SearchKind,
    search_backward: bool,
    search_origin: Position,
    picker: Option<BranchPicker>,
    /// Selections replaced by `expand_selection`, innermost last.
    expansions: Vec<Selection>,
    /// Column kept across vertical moves.
    preferred_col: Option<usize>,
    /// Internal clipboard; a trailing newline marks linewise text.
    register: String,
    branch: Option<String>,
    last_git_poll: Option<Instant>,
    /// Set by actions that position the view themselves.
    keep_view: bool,
    opts: Options,
    collab: Collaborators,
}

impl Dispatcher {
    pub fn new(opts: Options, collab: Collaborators) -> Self {
        let command_history = opts
            .paths
            .command_history()
            .map_or_else(History::in_memory, |p| History::load(&p));
        let search_history = opts
            .paths
            .search_history()
            .map_or_else(SearchHistory::in_memory, |p| SearchHistory::load(&p));
        let mut doc = Document {
            trailing_newline: true,
            ..Document::default()
        };
        doc.saved_lines.push(String::new());
        Self {
            buf: TextBuffer::new(),
            journal: UndoJournal::new(),
            highlights: HighlightCache::new(opts.large_file_threshold),
            search: SearchEngine::new(),
            modes: ModeMachine::default(),
            doc,
            view: View::new(22, 80, opts.scroll_margin),
            status: StatusLine::default(),
            prompt: PromptLine::default(),
            command_history,
            search_history,
            history_seed: None,
            search_kind: SearchKind::Literal,
            search_backward: false,
            search_origin: Position::default(),
            picker: None,
            expansions: Vec::new(),
            preferred_col: None,
            register: String::new(),
            branch: None,
            last_git_poll: None,
            keep_view: false,
            opts,
            collab,
        }
    }

    /// Load `path` (a missing file starts an empty new document) and restore
    /// its changelog.
    pub fn open(&mut self, path: &Path) -> std::io::Result<()> {
        let opened = io_ops::open_file(path)?;
        if opened.mixed_line_endings {
            self.status.set("mixed line endings normalized");
        } else if opened.is_new {
            self.status.set(format!("\"{}\" [new]", path.display()));
        }
        let journal = match self.opts.paths.changelog_dir() {
            Some(dir) if !opened.is_new => UndoJournal::restore(&changelog_path(&dir, path)),
            _ => UndoJournal::new(),
        };
        self.install(Some(path.to_path_buf()), opened, Position::default());
        self.journal = journal;
        info!(target: "io", path = %path.display(), lines = self.buf.line_count(), undo = self.journal.undo_len(), "document ready");
        Ok(())
    }

    /// Replace the document with unnamed text (scratch buffers and tests).
    pub fn set_text(&mut self, text: &str) {
        let normalized = core_state::normalize_line_endings(text);
        let opened = OpenedFile {
            text: normalized.text,
            line_ending: normalized.ending,
            trailing_newline: normalized.had_trailing_newline,
            mixed_line_endings: normalized.mixed,
            is_new: false,
        };
        self.install(None, opened, Position::default());
        self.journal = UndoJournal::new();
    }

    fn install(&mut self, path: Option<PathBuf>, opened: OpenedFile, cursor: Position) {
        self.buf = TextBuffer::from_text(&opened.text);
        self.buf.set_cursor(self.buf.clamp(cursor));
        self.doc = Document {
            language: path.as_deref().and_then(Language::from_path),
            path,
            line_ending: opened.line_ending,
            trailing_newline: opened.trailing_newline,
            saved_lines: (0..self.buf.line_count()).map(|r| self.buf.line_string(r)).collect(),
        };
        self.highlights.reset(self.buf.len_bytes());
        self.expansions.clear();
        self.view.first_line = 0;
        if !self.search.query().is_empty() {
            let _ = self.search.recompute(&self.buf);
        }
        if let Some(path) = &self.doc.path {
            self.collab.lsp.open_file(path, &opened.text);
        }
    }

    pub fn handle_event(&mut self, ev: &InputEvent) -> DispatchResult {
        match ev {
            InputEvent::Key(key) => self.handle_key(*key),
            InputEvent::Mouse(m) => self.handle_mouse(*m),
            InputEvent::Resize(cols, rows) => self.handle_resize(*cols, *rows),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DispatchResult {
        let tick_before = self.journal.change_tick();
        if !matches!(self.modes.mode, Mode::Command | Mode::Search) {
            self.status.clear();
        }
        trace!(target: "actions.dispatch", mode = self.modes.mode.label(), %key, "key");
        let result = match self.modes.mode {
            Mode::Normal => self.normal_key(key),
            Mode::Insert => self.insert_key(key),
            Mode::Command => self.command_key(key),
            Mode::Search => self.search_key(key),
            Mode::BranchPicker => self.picker_key(key),
        };
        self.after_input(tick_before);
        result
    }

    pub fn handle_mouse(&mut self, ev: MouseEvent) -> DispatchResult {
        let lines = self.buf.line_count();
        match ev.kind {
            MouseEventKind::ScrollUp => self.view.scroll_by(-WHEEL_STEP, lines),
            MouseEventKind::ScrollDown => self.view.scroll_by(WHEEL_STEP, lines),
            MouseEventKind::LeftDown => {
                let screen_row = usize::from(ev.row);
                if screen_row >= self.view.height
                    || !matches!(self.modes.mode, Mode::Normal | Mode::Insert)
                {
                    return DispatchResult::clean();
                }
                let row = (self.view.first_line + screen_row).min(lines.saturating_sub(1));
                let cells = usize::from(ev.column).saturating_sub(self.gutter_width());
                let col = width::col_at_cells(self.buf.line(row).unwrap_or(&[]), cells);
                self.buf.clear_selection();
                self.modes.select_mode = false;
                self.preferred_col = None;
                self.buf.set_cursor(Position::new(row, col));
                trace!(target: "actions.dispatch", row, col, "click");
            }
        }
        DispatchResult::dirty()
    }

    /// Terminal resized to `cols` x `rows`; two rows go to status and prompt.
    pub fn handle_resize(&mut self, cols: u16, rows: u16) -> DispatchResult {
        self.view.height = usize::from(rows).saturating_sub(2);
        self.view.width = usize::from(cols).saturating_sub(self.gutter_width());
        self.view.auto_scroll(self.buf.cursor().row);
        debug!(target: "actions.dispatch", cols, rows, height = self.view.height, "resize");
        DispatchResult::dirty()
    }

    /// Rows kept between the cursor and the window edge when scrolling.
    pub fn set_scroll_margin(&mut self, margin: usize) {
        self.view.margin = margin;
    }

    /// Periodic work: reparse and refresh highlights, poll the branch.
    /// Returns true when something visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let visible = self.view.visible_range(self.buf.line_count());
        let source = Source {
            path: self.doc.path.as_deref(),
            language: self.doc.language,
        };
        let outcome = self.highlights.tick(
            self.collab.parser.as_ref(),
            source,
            self.journal.change_tick(),
            visible,
            &mut self.buf,
        );
        let branch_changed = self.poll_git(now);
        outcome.refreshed || branch_changed
    }

    fn poll_git(&mut self, now: Instant) -> bool {
        if self
            .last_git_poll
            .is_some_and(|t| now.saturating_duration_since(t) < self.opts.git_poll)
        {
            return false;
        }
        self.last_git_poll = Some(now);
        let Some(path) = &self.doc.path else {
            return false;
        };
        let branch = self.collab.vcs.current_branch(path).ok();
        if branch == self.branch {
            return false;
        }
        debug!(target: "collab.git", ?branch, "branch changed");
        self.branch = branch;
        true
    }

    fn after_input(&mut self, tick_before: u64) {
        if self.journal.change_tick() != tick_before {
            if !self.search.query().is_empty() {
                let _ = self.search.recompute(&self.buf);
            }
            self.expansions.clear();
        }
        if std::mem::take(&mut self.keep_view) {
            return;
        }
        self.view.auto_scroll(self.buf.cursor().row);
    }

    fn normal_key(&mut self, key: KeyEvent) -> DispatchResult {
        let pending = std::mem::take(&mut self.modes.pending);
        if pending != Pending::None {
            return self.resolve_pending(pending, key);
        }
        let name = core_keymap::key_name(&key);
        match self.keyed_action(core_keymap::KeymapMode::Normal, &name) {
            Some(action) => self.run(action),
            None => DispatchResult::clean(),
        }
    }

    fn insert_key(&mut self, key: KeyEvent) -> DispatchResult {
        let name = core_keymap::key_name(&key);
        if let Some(action) = self.keyed_action(core_keymap::KeymapMode::Insert, &name) {
            return self.run(action);
        }
        match key.printable() {
            Some(c) => {
                self.type_char(c);
                DispatchResult::dirty()
            }
            None => DispatchResult::clean(),
        }
    }

    fn keyed_action(&self, mode: core_keymap::KeymapMode, name: &str) -> Option<Action> {
        let action_name = self.opts.keymap.lookup(mode, name)?;
        let action = Action::from_name(action_name);
        if action.is_none() {
            warn!(target: "actions.dispatch", key = name, action = action_name, "binding names no action");
        }
        action
    }

    /// Execute one action.
    pub fn run(&mut self, action: Action) -> DispatchResult {
        trace!(target: "actions.dispatch", ?action, "run");
        if !matches!(action, Action::ExpandSelection | Action::ShrinkSelection) {
            self.expansions.clear();
        }
        if !matches!(
            action,
            Action::Move(Motion::Up | Motion::Down | Motion::PageUp | Motion::PageDown)
                | Action::Extend(Motion::Up | Motion::Down | Motion::PageUp | Motion::PageDown)
        ) {
            self.preferred_col = None;
        }
        match action {
            Action::Move(m) => self.move_cursor(m),
            Action::Extend(m) => self.extend(m),
            Action::FindChar { forward, till } => {
                self.modes.pending = Pending::FindChar { forward, till };
            }
            Action::ReplaceChar => self.modes.pending = Pending::ReplaceChar,
            Action::OpenMenu(kind) => self.open_menu(kind),

            Action::EnterInsert
            | Action::Append
            | Action::InsertLineStart
            | Action::AppendLineEnd => self.enter_insert(action),
            Action::OpenBelow => self.open_line(true),
            Action::OpenAbove => self.open_line(false),
            Action::Change => self.change(),
            Action::EnterNormal => self.enter_normal(),
            Action::EnterCommand => self.begin_command(),
            Action::SearchForward => self.begin_search(SearchKind::Literal, false),
            Action::SearchBackward => self.begin_search(SearchKind::Literal, true),
            Action::SearchFuzzy => self.begin_search(SearchKind::Fuzzy, false),
            Action::SearchRegex => self.begin_search(SearchKind::Regex, false),
            Action::SearchNext => self.search_step(true),
            Action::SearchPrev => self.search_step(false),
            Action::BranchPicker => self.open_branch_picker(),

            Action::SelectLine => self.select_line(),
            Action::ToggleSelect => self.modes.select_mode = !self.modes.select_mode,
            Action::CollapseSelection => self.collapse_selection(),
            Action::FlipSelection => self.flip_selection(),
            Action::ExpandSelection => self.expand_selection(),
            Action::ShrinkSelection => self.shrink_selection(),

            Action::Delete => self.delete_forward(),
            Action::DeleteBack => self.delete_back(),
            Action::DeleteWordLeft => self.delete_word_left(),
            Action::InsertNewline => self.insert_newline(),
            Action::InsertIndent => self.insert_indent(),
            Action::JoinLines => self.join_lines(),
            Action::DeleteLine => self.delete_line(),
            Action::Indent => self.indent(),
            Action::Unindent => self.unindent(),
            Action::RestoreLine => self.restore_line(),
            Action::MoveLineUp => self.move_line(true),
            Action::MoveLineDown => self.move_line(false),
            Action::Yank => self.yank(),
            Action::PasteAfter => self.paste(true),
            Action::PasteBefore => self.paste(false),
            Action::Undo => self.undo(),
            Action::Redo => self.redo(),

            Action::AlignTop => self.align(core_state::Align::Top),
            Action::AlignCenter => self.align(core_state::Align::Center),
            Action::AlignBottom => self.align(core_state::Align::Bottom),
            Action::ScrollUp => self.scroll(-1),
            Action::ScrollDown => self.scroll(1),

            Action::Save => return self.execute_command("w"),
            Action::Quit => return self.execute_command("q"),
        }
        DispatchResult::dirty()
    }

    fn gutter_width(&self) -> usize {
        self.opts.line_numbers.gutter_width(self.buf.line_count())
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buf
    }

    pub fn journal(&self) -> &UndoJournal {
        &self.journal
    }

    pub fn mode(&self) -> Mode {
        self.modes.mode
    }

    pub fn pending(&self) -> Pending {
        self.modes.pending
    }

    /// Menu awaiting its key, if any.
    pub fn open_menu_kind(&self) -> Option<MenuKind> {
        match self.modes.pending {
            Pending::Menu(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn select_mode(&self) -> bool {
        self.modes.select_mode
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn status(&self) -> Option<&str> {
        self.status.message()
    }

    /// Prompt label and typed text while a prompt is active.
    pub fn prompt(&self) -> Option<(&'static str, &str)> {
        let label = match self.modes.mode {
            Mode::Command => ":",
            Mode::Search => match (self.search_kind, self.search_backward) {
                (SearchKind::Literal, false) => "/",
                (SearchKind::Literal, true) => "?",
                (SearchKind::Fuzzy, _) => "fuzzy/",
                (SearchKind::Regex, _) => "regex/",
            },
            _ => return None,
        };
        Some((label, self.prompt.text()))
    }

    pub fn search(&self) -> &SearchEngine {
        &self.search
    }

    pub fn highlights(&self) -> &HighlightCache {
        &self.highlights
    }

    pub fn line_numbers(&self) -> LineNumbers {
        self.opts.line_numbers
    }

    pub fn path(&self) -> Option<&Path> {
        self.doc.path.as_deref()
    }

    pub fn language(&self) -> Option<Language> {
        self.doc.language
    }

    pub fn line_ending(&self) -> LineEnding {
        self.doc.line_ending
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.journal.is_dirty()
    }

    pub fn picker(&self) -> Option<&BranchPicker> {
        self.picker.as_ref()
    }

    /// Internal clipboard contents.
    pub fn register(&self) -> &str {
        &self.register
    }

    /// Apply one mutation and record it.
    fn apply(&mut self, action: EditAction) -> bool {
        if !action.apply(&mut self.buf) {
            debug!(target: "actions.dispatch", ?action, "edit rejected");
            return false;
        }
        self.journal.record(action);
        true
    }

    /// Run `f` as one undo group. A failing step reverts the whole group.
    fn grouped(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        self.journal.begin_group();
        let ok = f(self);
        if ok {
            self.journal.end_group();
        } else {
            self.journal.abort_group(&mut self.buf);
        }
        ok
    }
}
