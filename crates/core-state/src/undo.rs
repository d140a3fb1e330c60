//! Grouped undo/redo journal.
//!
//! Every mutation is recorded as one or more [`EditAction`]s tagged with a
//! group id. Undo pops a whole group, applies the inverse of each action and
//! pushes the inverse onto the redo stack under the same group id. Redo is the
//! same operation with the stacks swapped.

use core_text::{Position, Selection, TextBuffer};
use tracing::{debug, trace};

/// One reversible mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    InsertRune {
        pos: Position,
        rune: char,
    },
    DeleteRune {
        pos: Position,
        rune: char,
    },
    SplitLine {
        pos: Position,
    },
    JoinLine {
        pos: Position,
    },
    MoveLine {
        from: usize,
        to: usize,
    },
    InsertText {
        pos: Position,
        lines: Vec<String>,
        selection: Option<Selection>,
    },
    DeleteText {
        pos: Position,
        end: Position,
        lines: Vec<String>,
        selection: Option<Selection>,
    },
}

/// End position of `lines` inserted at `pos`.
pub fn text_end(pos: Position, lines: &[String]) -> Position {
    match lines.len() {
        0 => pos,
        1 => Position::new(pos.row, pos.col + lines[0].chars().count()),
        n => Position::new(pos.row + n - 1, lines[n - 1].chars().count()),
    }
}

impl EditAction {
    pub fn inverse(&self) -> EditAction {
        match self.clone() {
            EditAction::InsertRune { pos, rune } => EditAction::DeleteRune { pos, rune },
            EditAction::DeleteRune { pos, rune } => EditAction::InsertRune { pos, rune },
            EditAction::SplitLine { pos } => EditAction::JoinLine { pos },
            EditAction::JoinLine { pos } => EditAction::SplitLine { pos },
            EditAction::MoveLine { from, to } => EditAction::MoveLine { from: to, to: from },
            EditAction::InsertText {
                pos,
                lines,
                selection,
            } => EditAction::DeleteText {
                pos,
                end: text_end(pos, &lines),
                lines,
                selection,
            },
            EditAction::DeleteText {
                pos,
                lines,
                selection,
                ..
            } => EditAction::InsertText {
                pos,
                lines,
                selection,
            },
        }
    }

    /// Apply to `buf`. Returns false (leaving `buf` untouched) when the
    /// document does not match what the action expects.
    pub fn apply(&self, buf: &mut TextBuffer) -> bool {
        let in_doc = |buf: &TextBuffer, p: Position| {
            p.row < buf.line_count() && p.col <= buf.line_len(p.row)
        };
        match self {
            EditAction::InsertRune { pos, rune } => {
                in_doc(buf, *pos) && buf.insert_rune(*pos, *rune)
            }
            EditAction::DeleteRune { pos, rune } => {
                if buf.char_at(*pos) != Some(*rune) {
                    return false;
                }
                buf.delete_rune(*pos).is_some()
            }
            EditAction::SplitLine { pos } => in_doc(buf, *pos) && buf.split_line(*pos),
            EditAction::JoinLine { pos } => {
                in_doc(buf, *pos) && pos.col == buf.line_len(pos.row) && buf.join_line(*pos)
            }
            EditAction::MoveLine { from, to } => buf.move_line(*from, *to),
            EditAction::InsertText {
                pos,
                lines,
                selection,
            } => {
                let empty = lines.iter().all(|l| l.is_empty()) && lines.len() < 2;
                if empty || !in_doc(buf, *pos) {
                    return false;
                }
                buf.insert_text(*pos, lines);
                match selection {
                    Some(sel) => {
                        buf.set_selection(*sel);
                        buf.set_cursor(sel.head);
                    }
                    None => buf.clear_selection(),
                }
                true
            }
            EditAction::DeleteText {
                pos, end, lines, ..
            } => {
                if !in_doc(buf, *pos) || !in_doc(buf, *end) {
                    return false;
                }
                if buf.text_in_range(*pos, *end) != *lines {
                    return false;
                }
                buf.delete_text_range(*pos, *end);
                buf.clear_selection();
                true
            }
        }
    }
}

/// An action plus its group id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub action: EditAction,
    pub group: u64,
}

/// Which stack an undo/redo step failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    /// Stack was empty.
    Empty,
    /// An action could not be applied; the entry stays on its stack.
    Failed,
}

#[derive(Debug, Default)]
pub struct UndoJournal {
    undo: Vec<JournalEntry>,
    redo: Vec<JournalEntry>,
    save_point: Option<usize>,
    next_group: u64,
    open_group: Option<u64>,
    group_depth: usize,
    group_len: usize,
    change_tick: u64,
}

impl UndoJournal {
    pub fn new() -> Self {
        Self {
            save_point: Some(0),
            next_group: 1,
            ..Self::default()
        }
    }

    /// Journal rebuilt from persisted entries; the restored state counts as saved.
    pub fn from_entries(entries: Vec<JournalEntry>) -> Self {
        let next_group = entries.iter().map(|e| e.group).max().unwrap_or(0) + 1;
        let len = entries.len();
        Self {
            undo: entries,
            save_point: Some(len),
            next_group,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.undo
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn change_tick(&self) -> u64 {
        self.change_tick
    }

    /// Advance the change tick for a mutation the journal does not record
    /// (reload, format).
    pub fn note_change(&mut self) {
        self.change_tick += 1;
    }

    /// Unsaved changes exist. Once the saved state is dropped with a
    /// discarded redo branch no undo depth matches it again.
    pub fn is_dirty(&self) -> bool {
        self.save_point != Some(self.undo.len())
    }

    pub fn mark_saved(&mut self) {
        self.save_point = Some(self.undo.len());
    }

    /// Drop all history (buffer replaced).
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.save_point = Some(0);
        self.open_group = None;
        self.group_depth = 0;
        self.group_len = 0;
        self.change_tick += 1;
    }

    /// Open a group. Nested calls join the outermost group.
    pub fn begin_group(&mut self) {
        if self.group_depth == 0 {
            self.open_group = Some(self.alloc_group());
            self.group_len = 0;
        }
        self.group_depth += 1;
    }

    /// Close a group. Closing the outermost group after at least one record
    /// advances the change tick once.
    pub fn end_group(&mut self) {
        if self.group_depth == 0 {
            return;
        }
        self.group_depth -= 1;
        if self.group_depth == 0 {
            self.open_group = None;
            if self.group_len > 0 {
                self.change_tick += 1;
            }
            trace!(
                target: "state.undo",
                actions = self.group_len,
                undo_depth = self.undo.len(),
                "end_group"
            );
        }
    }

    /// Revert and discard everything recorded in the open group, then close it.
    pub fn abort_group(&mut self, buf: &mut TextBuffer) {
        let Some(group) = self.open_group else {
            return;
        };
        let mut reverted = 0;
        while self.undo.last().is_some_and(|e| e.group == group) {
            if let Some(entry) = self.undo.pop() {
                entry.action.inverse().apply(buf);
                reverted += 1;
            }
        }
        debug!(target: "state.undo", group, reverted, "abort_group");
        self.group_depth = 0;
        self.group_len = 0;
        self.open_group = None;
        if reverted > 0 {
            buf.invalidate_edit();
        }
    }

    fn alloc_group(&mut self) -> u64 {
        let g = self.next_group;
        self.next_group += 1;
        g
    }

    /// Record an applied mutation. Clears the redo stack.
    pub fn record(&mut self, action: EditAction) {
        let group = match self.open_group {
            Some(g) => g,
            None => self.alloc_group(),
        };
        if !self.redo.is_empty() {
            self.redo.clear();
            // The saved state lived on the discarded branch.
            if self.save_point.is_some_and(|sp| sp > self.undo.len()) {
                self.save_point = None;
            }
        }
        self.undo.push(JournalEntry { action, group });
        if self.open_group.is_some() {
            self.group_len += 1;
        } else {
            self.change_tick += 1;
        }
        trace!(target: "state.undo", group, undo_depth = self.undo.len(), "record");
    }

    pub fn undo(&mut self, buf: &mut TextBuffer) -> Result<(), StepError> {
        let r = Self::step(&mut self.undo, &mut self.redo, buf);
        self.after_step(buf, "undo", r)
    }

    pub fn redo(&mut self, buf: &mut TextBuffer) -> Result<(), StepError> {
        let r = Self::step(&mut self.redo, &mut self.undo, buf);
        self.after_step(buf, "redo", r)
    }

    fn after_step(
        &mut self,
        buf: &mut TextBuffer,
        what: &'static str,
        r: Result<usize, StepError>,
    ) -> Result<(), StepError> {
        match r {
            Ok(n) => {
                buf.invalidate_edit();
                self.change_tick += 1;
                trace!(
                    target: "state.undo",
                    op = what,
                    actions = n,
                    undo_depth = self.undo.len(),
                    redo_depth = self.redo.len(),
                    "step"
                );
                Ok(())
            }
            Err(StepError::Failed) => {
                buf.invalidate_edit();
                self.change_tick += 1;
                debug!(target: "state.undo", op = what, "step failed");
                Err(StepError::Failed)
            }
            Err(e) => Err(e),
        }
    }

    fn step(
        from: &mut Vec<JournalEntry>,
        to: &mut Vec<JournalEntry>,
        buf: &mut TextBuffer,
    ) -> Result<usize, StepError> {
        let group = from.last().ok_or(StepError::Empty)?.group;
        let mut applied = 0;
        while let Some(entry) = from.pop() {
            if entry.group != group {
                from.push(entry);
                break;
            }
            let inverse = entry.action.inverse();
            if !inverse.apply(buf) {
                from.push(entry);
                return Err(StepError::Failed);
            }
            to.push(JournalEntry {
                action: inverse,
                group,
            });
            applied += 1;
        }
        Ok(applied)
    }
}
