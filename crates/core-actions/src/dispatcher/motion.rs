//! Cursor movement and selection shaping.
//!
//! Plain motions collapse the selection unless the select latch is on, in
//! which case they extend it like the shift variants. Word motions in
//! Normal mode select the text they cross and turn the latch on.

use core_state::{Align, Mode};
use core_text::{Position, Selection, motion};
use tracing::trace;

use super::Dispatcher;
use crate::Motion;

impl Dispatcher {
    /// Where `m` takes the cursor from `from`, or `None` when it cannot move.
    fn motion_target(&mut self, m: Motion, from: Position) -> Option<Position> {
        let buf = &self.buf;
        let lines = buf.line_count();
        let to = match m {
            Motion::Left => motion::left(buf, from),
            Motion::Right => motion::right(buf, from),
            Motion::Up | Motion::Down | Motion::PageUp | Motion::PageDown => {
                let col = *self.preferred_col.get_or_insert(from.col);
                let sticky = Position::new(from.row, col);
                let moved = match m {
                    Motion::Up => motion::up(buf, sticky),
                    Motion::Down => motion::down(buf, sticky),
                    Motion::PageUp => motion::page_up(buf, sticky, self.view.height),
                    _ => motion::page_down(buf, sticky, self.view.height),
                };
                if moved.row == from.row {
                    from
                } else {
                    moved
                }
            }
            Motion::WordRight => motion::word_right(buf, from),
            Motion::WordLeft => motion::word_left(buf, from),
            Motion::WordEnd => motion::word_end(buf, from),
            Motion::LineStart => motion::line_start(from),
            Motion::LineEnd => motion::line_end(buf, from),
            Motion::FirstNonBlank => motion::first_non_blank(buf, from),
            Motion::FileStart => motion::doc_start(),
            Motion::FileEnd => motion::doc_end(buf),
            Motion::WindowTop => self.window_target(Align::Top, lines),
            Motion::WindowCenter => self.window_target(Align::Center, lines),
            Motion::WindowBottom => self.window_target(Align::Bottom, lines),
            Motion::MatchBracket => match motion::matching_bracket(buf, from) {
                Some(p) => p,
                None => {
                    self.status.set("no matching bracket");
                    return None;
                }
            },
        };
        (to != from).then_some(to)
    }

    fn window_target(&self, align: Align, lines: usize) -> Position {
        let row = self.view.window_row(align, lines);
        motion::first_non_blank(&self.buf, Position::new(row, 0))
    }

    pub(super) fn move_cursor(&mut self, m: Motion) {
        let from = self.buf.cursor();
        let Some(to) = self.motion_target(m, from) else {
            return;
        };
        trace!(target: "actions.dispatch", ?m, row = to.row, col = to.col, "move");
        if self.modes.mode == Mode::Normal && m.is_selecting() {
            self.select_to(from, to);
        } else if self.modes.select_mode {
            self.extend_to(to);
        } else {
            self.buf.clear_selection();
            self.buf.set_cursor(to);
        }
    }

    pub(super) fn extend(&mut self, m: Motion) {
        let from = self.buf.cursor();
        if let Some(to) = self.motion_target(m, from) {
            self.extend_to(to);
        }
    }

    /// Move the head to `to`, anchoring at the cursor if nothing is selected.
    fn extend_to(&mut self, to: Position) {
        let sel = self.buf.selection();
        let anchor = if sel.active {
            sel.anchor
        } else {
            self.buf.cursor()
        };
        self.buf.set_selection(Selection::new(anchor, to));
        self.buf.set_cursor(to);
    }

    /// Selecting motion from `from` to `to`; extends instead while latched.
    pub(super) fn select_to(&mut self, from: Position, to: Position) {
        if self.modes.select_mode {
            self.extend_to(to);
            return;
        }
        self.buf.set_selection(Selection::new(from, to));
        self.buf.set_cursor(to);
        self.modes.select_mode = true;
    }

    /// `x`: select the cursor line with its newline; repeated presses grow
    /// the selection downward one line at a time.
    pub(super) fn select_line(&mut self) {
        let lines = self.buf.line_count();
        let line_span = |buf: &core_text::TextBuffer, row: usize| {
            if row + 1 < lines {
                Position::new(row + 1, 0)
            } else {
                Position::new(row, buf.line_len(row))
            }
        };
        let sel = self.buf.selection();
        let (anchor, head) = match self.buf.selection_range() {
            Some((start, end)) if start.col == 0 && sel.head == end => {
                let next = if end.col == 0 { end.row } else { end.row + 1 };
                if next >= lines {
                    return;
                }
                (start, line_span(&self.buf, next))
            }
            _ => {
                let row = self.buf.cursor().row;
                (Position::new(row, 0), line_span(&self.buf, row))
            }
        };
        self.buf.set_selection(Selection::new(anchor, head));
        self.buf.set_cursor(head);
    }

    pub(super) fn collapse_selection(&mut self) {
        self.buf.clear_selection();
        self.modes.select_mode = false;
    }

    pub(super) fn flip_selection(&mut self) {
        let sel = self.buf.selection();
        if !sel.active {
            return;
        }
        self.buf.set_selection(Selection::new(sel.head, sel.anchor));
        self.buf.set_cursor(sel.anchor);
    }

    /// Grow the selection to the innermost syntax node strictly enclosing it.
    pub(super) fn expand_selection(&mut self) {
        let Some(path) = self.doc.path.clone() else {
            return;
        };
        let cursor = self.buf.cursor();
        let (start, end) = self.buf.selection_range().unwrap_or((cursor, cursor));
        let stack = self.collab.parser.node_stack_at(&path, start);
        let Some(node) = stack
            .into_iter()
            .find(|n| n.start <= start && n.end >= end && (n.start, n.end) != (start, end))
        else {
            return;
        };
        trace!(target: "actions.dispatch", depth = self.expansions.len() + 1, "expand selection");
        self.expansions.push(self.buf.selection());
        self.buf.set_selection(Selection::new(node.start, node.end));
        self.buf.set_cursor(node.end);
    }

    pub(super) fn shrink_selection(&mut self) {
        match self.expansions.pop() {
            Some(prev) if prev.active => {
                self.buf.set_selection(prev);
                self.buf.set_cursor(prev.head);
            }
            _ => self.buf.clear_selection(),
        }
    }

    pub(super) fn align(&mut self, align: Align) {
        self.view.align(self.buf.cursor().row, align);
        self.keep_view = true;
    }

    /// Scroll the view one row, dragging the cursor along when it would
    /// leave the window.
    pub(super) fn scroll(&mut self, delta: isize) {
        let lines = self.buf.line_count();
        self.view.scroll_by(delta, lines);
        let (first, end) = self.view.visible_range(lines);
        let cur = self.buf.cursor();
        let row = cur.row.clamp(first, end.saturating_sub(1).max(first));
        if row != cur.row {
            self.buf.set_cursor(self.buf.clamp(Position::new(row, cur.col)));
        }
        self.keep_view = true;
    }
}
