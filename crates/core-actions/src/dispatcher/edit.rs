//! Buffer mutations. Each user-level edit becomes one or more [`EditAction`]s
//! applied through [`Dispatcher::apply`]; anything that takes more than one
//! step runs inside [`Dispatcher::grouped`] so undo reverts it at once.

use core_state::{EditAction, Mode};
use core_text::{Position, Selection, motion};
use tracing::debug;

use super::Dispatcher;

/// Chars of leading whitespace `unindent` removes from `line`.
fn unindent_width(line: &[char], unit: usize) -> usize {
    if line.first() == Some(&'\t') {
        return 1;
    }
    line.iter().take(unit).take_while(|c| **c == ' ').count()
}

impl Dispatcher {
    fn delete_range(
        &mut self,
        start: Position,
        end: Position,
        selection: Option<Selection>,
    ) -> bool {
        if start >= end {
            return true;
        }
        let lines = self.buf.text_in_range(start, end);
        self.apply(EditAction::DeleteText {
            pos: start,
            end,
            lines,
            selection,
        })
    }

    fn insert_lines(&mut self, pos: Position, lines: Vec<String>) -> bool {
        if lines.len() < 2 && lines.iter().all(String::is_empty) {
            return true;
        }
        self.apply(EditAction::InsertText {
            pos,
            lines,
            selection: None,
        })
    }

    /// Delete the active selection (not grouped). No-op without one.
    fn remove_selection(&mut self) -> bool {
        let Some((start, end)) = self.buf.selection_range() else {
            return true;
        };
        let snapshot = self.buf.selection();
        self.modes.select_mode = false;
        self.delete_range(start, end, Some(snapshot))
    }

    pub(super) fn delete_selection(&mut self) -> bool {
        self.grouped(Self::remove_selection)
    }

    /// `d` / Delete: the selection, else the char under the cursor, else the
    /// line break.
    pub(super) fn delete_forward(&mut self) {
        if self.buf.selection_range().is_some() {
            self.delete_selection();
            return;
        }
        self.buf.clear_selection();
        self.modes.select_mode = false;
        let pos = self.buf.cursor();
        match self.buf.char_at(pos) {
            Some(rune) => {
                self.apply(EditAction::DeleteRune { pos, rune });
            }
            None if pos.row + 1 < self.buf.line_count() => {
                self.apply(EditAction::JoinLine { pos });
            }
            None => {}
        }
    }

    pub(super) fn delete_back(&mut self) {
        if self.buf.selection_range().is_some() {
            self.delete_selection();
            return;
        }
        let pos = self.buf.cursor();
        if pos.col > 0 {
            let at = Position::new(pos.row, pos.col - 1);
            if let Some(rune) = self.buf.char_at(at) {
                self.apply(EditAction::DeleteRune { pos: at, rune });
            }
        } else if pos.row > 0 {
            let prev = pos.row - 1;
            self.apply(EditAction::JoinLine {
                pos: Position::new(prev, self.buf.line_len(prev)),
            });
        }
    }

    /// Delete back to the previous word start on this line, or the line break
    /// at column zero.
    pub(super) fn delete_word_left(&mut self) {
        if self.buf.selection_range().is_some() {
            self.delete_selection();
            return;
        }
        let pos = self.buf.cursor();
        if pos.col == 0 {
            self.delete_back();
            return;
        }
        let mut start = motion::word_left(&self.buf, pos);
        if start.row != pos.row {
            start = Position::new(pos.row, 0);
        }
        self.grouped(|d| d.delete_range(start, pos, None));
    }

    /// Insert-mode typing. Replaces an active selection in the same group.
    pub(super) fn type_char(&mut self, rune: char) {
        if self.buf.selection_range().is_none() {
            self.buf.clear_selection();
            let pos = self.buf.cursor();
            self.apply(EditAction::InsertRune { pos, rune });
            return;
        }
        self.grouped(|d| {
            d.remove_selection()
                && d.apply(EditAction::InsertRune {
                    pos: d.buf.cursor(),
                    rune,
                })
        });
    }

    /// Enter: split the line and carry the indentation left of the cursor.
    pub(super) fn insert_newline(&mut self) {
        self.grouped(|d| {
            if !d.remove_selection() {
                return false;
            }
            let pos = d.buf.cursor();
            let indent: String = d.buf.indent_of(pos.row).chars().take(pos.col).collect();
            d.apply(EditAction::SplitLine { pos })
                && d.insert_lines(Position::new(pos.row + 1, 0), vec![indent])
        });
    }

    pub(super) fn insert_indent(&mut self) {
        let unit = self.opts.indent_unit.clone();
        self.grouped(|d| d.remove_selection() && d.insert_lines(d.buf.cursor(), vec![unit]));
    }

    /// `o` / `O`: open a line below or above carrying the current indent,
    /// then enter Insert.
    pub(super) fn open_line(&mut self, below: bool) {
        self.buf.clear_selection();
        self.modes.select_mode = false;
        let row = self.buf.cursor().row;
        let indent = self.buf.indent_of(row);
        let indent_len = indent.chars().count();
        let ok = self.grouped(|d| {
            if below {
                let eol = Position::new(row, d.buf.line_len(row));
                d.apply(EditAction::SplitLine { pos: eol })
                    && d.insert_lines(Position::new(row + 1, 0), vec![indent])
            } else {
                d.apply(EditAction::SplitLine {
                    pos: Position::new(row, 0),
                }) && d.insert_lines(Position::new(row, 0), vec![indent])
            }
        });
        if ok {
            let target_row = if below { row + 1 } else { row };
            self.buf.set_cursor(Position::new(target_row, indent_len));
        }
        self.modes.set(Mode::Insert);
    }

    /// `c`: delete the selection, then Insert.
    pub(super) fn change(&mut self) {
        self.delete_selection();
        self.buf.clear_selection();
        self.modes.select_mode = false;
        self.modes.set(Mode::Insert);
    }

    /// `r<c>`: replace the char under the cursor; the cursor stays.
    pub(super) fn replace_char(&mut self, rune: char) {
        let pos = self.buf.cursor();
        let Some(old) = self.buf.char_at(pos) else {
            return;
        };
        if old == rune {
            return;
        }
        let ok = self.grouped(|d| {
            d.apply(EditAction::DeleteRune { pos, rune: old })
                && d.apply(EditAction::InsertRune { pos, rune })
        });
        if ok {
            self.buf.set_cursor(pos);
        }
    }

    /// `J`: join the next line onto this one with a single space.
    pub(super) fn join_lines(&mut self) {
        let row = self.buf.cursor().row;
        if row + 1 >= self.buf.line_count() {
            return;
        }
        let left_len = self.buf.line_len(row);
        let next = self.buf.line(row + 1).unwrap_or(&[]);
        let lead = next.iter().take_while(|c| c.is_whitespace()).count();
        let next_blank = lead == next.len();
        let ends_blank = self
            .buf
            .line(row)
            .and_then(|l| l.last())
            .is_none_or(|c| c.is_whitespace());
        let join_at = Position::new(row, left_len);
        let ok = self.grouped(|d| {
            d.delete_range(Position::new(row + 1, 0), Position::new(row + 1, lead), None)
                && d.apply(EditAction::JoinLine { pos: join_at })
                && (next_blank
                    || ends_blank
                    || d.apply(EditAction::InsertRune {
                        pos: join_at,
                        rune: ' ',
                    }))
        });
        if ok {
            self.buf.set_cursor(join_at);
        }
    }

    /// `D`: delete the cursor line. The line goes to the register.
    pub(super) fn delete_line(&mut self) {
        self.buf.clear_selection();
        self.modes.select_mode = false;
        let row = self.buf.cursor().row;
        let lines = self.buf.line_count();
        let (start, end) = if row + 1 < lines {
            (Position::new(row, 0), Position::new(row + 1, 0))
        } else if row > 0 {
            (
                Position::new(row - 1, self.buf.line_len(row - 1)),
                Position::new(row, self.buf.line_len(row)),
            )
        } else {
            (Position::new(0, 0), Position::new(0, self.buf.line_len(0)))
        };
        if start == end {
            return;
        }
        self.register = format!("{}\n", self.buf.line_string(row));
        if self.grouped(|d| d.delete_range(start, end, None)) {
            let row = row.min(self.buf.line_count() - 1);
            let pos = motion::first_non_blank(&self.buf, Position::new(row, 0));
            self.buf.set_cursor(pos);
        }
    }

    /// Rows `>`/`<` act on: the selected lines (an end at column zero does
    /// not count its row), else the cursor row.
    fn target_rows(&self) -> (usize, usize) {
        match self.buf.selection_range() {
            Some((start, end)) if end.col == 0 && end.row > start.row => (start.row, end.row - 1),
            Some((start, end)) => (start.row, end.row),
            None => {
                let row = self.buf.cursor().row;
                (row, row)
            }
        }
    }

    /// Shift the cursor and selection after an indent change on `rows`.
    fn shift_after_indent(&mut self, rows: (usize, usize), deltas: &[isize]) {
        let shift = |p: Position| {
            if p.row < rows.0 || p.row > rows.1 || p.col == 0 {
                return p;
            }
            let d = deltas[p.row - rows.0];
            Position::new(p.row, p.col.saturating_add_signed(d))
        };
        let sel = self.buf.selection();
        let cursor = self.buf.cursor();
        if sel.active {
            self.buf.set_selection(Selection::new(shift(sel.anchor), shift(sel.head)));
        }
        self.buf.set_cursor(shift(cursor));
    }

    pub(super) fn indent(&mut self) {
        let (first, last) = self.target_rows();
        let unit = self.opts.indent_unit.clone();
        let unit_len = unit.chars().count() as isize;
        let sel = self.buf.selection();
        let cursor = self.buf.cursor();
        let deltas: Vec<isize> = (first..=last)
            .map(|r| if self.buf.line_len(r) > 0 { unit_len } else { 0 })
            .collect();
        let ok = self.grouped(|d| {
            (first..=last).all(|r| {
                d.buf.line_len(r) == 0 || d.insert_lines(Position::new(r, 0), vec![unit.clone()])
            })
        });
        if ok {
            self.buf.set_cursor(cursor);
            if sel.active {
                self.buf.set_selection(sel);
            }
            self.shift_after_indent((first, last), &deltas);
        }
    }

    pub(super) fn unindent(&mut self) {
        let (first, last) = self.target_rows();
        let unit = self.opts.indent_unit.chars().count().max(1);
        let sel = self.buf.selection();
        let cursor = self.buf.cursor();
        let widths: Vec<usize> = (first..=last)
            .map(|r| unindent_width(self.buf.line(r).unwrap_or(&[]), unit))
            .collect();
        if widths.iter().all(|w| *w == 0) {
            return;
        }
        let ok = self.grouped(|d| {
            (first..=last)
                .zip(&widths)
                .all(|(r, w)| d.delete_range(Position::new(r, 0), Position::new(r, *w), None))
        });
        if ok {
            self.buf.set_cursor(cursor);
            if sel.active {
                self.buf.set_selection(sel);
            }
            let deltas: Vec<isize> = widths.iter().map(|w| -(*w as isize)).collect();
            self.shift_after_indent((first, last), &deltas);
        }
    }

    /// `alt+r`: put back the cursor line as it was last read or written.
    pub(super) fn restore_line(&mut self) {
        let pos = self.buf.cursor();
        let Some(saved) = self.doc.saved_lines.get(pos.row).cloned() else {
            self.status.set("no saved line");
            return;
        };
        let current = self.buf.line_string(pos.row);
        if current == saved {
            return;
        }
        let len = self.buf.line_len(pos.row);
        let saved_len = saved.chars().count();
        let ok = self.grouped(|d| {
            d.delete_range(Position::new(pos.row, 0), Position::new(pos.row, len), None)
                && d.insert_lines(Position::new(pos.row, 0), vec![saved])
        });
        if ok {
            self.buf.set_cursor(Position::new(pos.row, pos.col.min(saved_len)));
        }
    }

    pub(super) fn move_line(&mut self, up: bool) {
        let row = self.buf.cursor().row;
        let to = if up {
            match row.checked_sub(1) {
                Some(r) => r,
                None => return,
            }
        } else {
            if row + 1 >= self.buf.line_count() {
                return;
            }
            row + 1
        };
        self.buf.clear_selection();
        self.apply(EditAction::MoveLine { from: row, to });
    }

    /// `y`: the selection, else the cursor line (linewise).
    pub(super) fn yank(&mut self) {
        let text = match self.buf.selection_range() {
            Some((start, end)) => self.buf.text_in_range(start, end).join("\n"),
            None => format!("{}\n", self.buf.line_string(self.buf.cursor().row)),
        };
        self.register = text;
        match self.collab.clipboard.copy(&self.register) {
            Ok(()) => self.status.set(format!("yanked {} chars", self.register.chars().count())),
            Err(e) => self.status.set(e.to_string()),
        }
    }

    /// `p` / `P`. Linewise text (ending in a newline) goes on its own lines
    /// below or above; other text goes after or at the cursor. An active
    /// selection is replaced.
    pub(super) fn paste(&mut self, after: bool) {
        let text = match self.collab.clipboard.paste() {
            Ok(t) => t.replace("\r\n", "\n"),
            Err(e) => {
                self.status.set(e.to_string());
                self.register.clone()
            }
        };
        if text.is_empty() {
            return;
        }
        let linewise = text.ends_with('\n');
        let replacing = self.buf.selection_range().is_some();
        let mut landed = None;
        self.grouped(|d| {
            if !d.remove_selection() {
                return false;
            }
            let cur = d.buf.cursor();
            let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
            let pos = if replacing || !linewise {
                if after && !replacing {
                    motion::right(&d.buf, cur)
                } else {
                    cur
                }
            } else if !after {
                Position::new(cur.row, 0)
            } else if cur.row + 1 < d.buf.line_count() {
                Position::new(cur.row + 1, 0)
            } else {
                lines.pop();
                lines.insert(0, String::new());
                Position::new(cur.row, d.buf.line_len(cur.row))
            };
            landed = Some(if linewise && !replacing {
                Position::new(if after { cur.row + 1 } else { cur.row }, 0)
            } else {
                pos
            });
            d.insert_lines(pos, lines)
        });
        if let Some(pos) = landed {
            debug!(target: "actions.dispatch", linewise, row = pos.row, "paste");
            if linewise && !replacing {
                self.buf.set_cursor(pos);
            }
        }
    }
}
