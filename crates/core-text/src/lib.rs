//! Line-oriented text document with cursor, selection and edit primitives.
//!
//! The document is a dense sequence of lines, each a sequence of code points.
//! Columns at the API boundary are always code-point indices. Byte offsets
//! only appear inside [`TextEdit`], which is the delta handed to the
//! incremental parser.
//!
//! Every primitive mutates exactly one place, settles the cursor
//! deterministically and records a [`TextEdit`]. The pending edit is a
//! consume-once slot: a second mutation before it is taken downgrades it to
//! [`PendingEdit::Reparse`] because one delta cannot describe both.

pub mod motion;
pub mod width;

pub use motion::CharClass;

/// Cursor / document position. `col` counts code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Anchor/head selection. Ordering of the endpoints is lexicographic row then col.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: Position,
    pub head: Position,
    pub active: bool,
}

impl Selection {
    pub fn new(anchor: Position, head: Position) -> Self {
        Self {
            anchor,
            head,
            active: true,
        }
    }

    /// `(start, end)` with `start <= end`.
    pub fn normalized(&self) -> (Position, Position) {
        if self.anchor <= self.head {
            (self.anchor, self.head)
        } else {
            (self.head, self.anchor)
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.active || self.anchor == self.head
    }
}

/// Row plus byte column, the coordinate system of the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

/// Structural edit delta. Offsets describe the document before the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

/// State of the consume-once edit slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingEdit {
    /// No mutation since the last take.
    #[default]
    Clean,
    /// Exactly one mutation, describable incrementally.
    Incremental(TextEdit),
    /// Several mutations (or an explicit invalidation): full reparse.
    Reparse,
}

impl PendingEdit {
    /// The incremental delta, if any.
    pub fn edit(&self) -> Option<&TextEdit> {
        match self {
            PendingEdit::Incremental(e) => Some(e),
            _ => None,
        }
    }
}

fn utf8_len(chars: &[char]) -> usize {
    chars.iter().map(|c| c.len_utf8()).sum()
}

/// The document. Always holds at least one line.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: Vec<Vec<char>>,
    cursor: Position,
    selection: Selection,
    pending: PendingEdit,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    /// Empty document: a single empty line.
    pub fn new() -> Self {
        Self {
            lines: vec![Vec::new()],
            cursor: Position::default(),
            selection: Selection::default(),
            pending: PendingEdit::Clean,
        }
    }

    /// Build from `\n` separated text. A trailing newline yields a trailing
    /// empty line; callers that track "file ends with newline" strip it first.
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<Vec<char>> = text.split('\n').map(|l| l.chars().collect()).collect();
        Self {
            lines,
            ..Self::new()
        }
    }

    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        if lines.is_empty() {
            return Self::new();
        }
        Self {
            lines: lines.iter().map(|l| l.as_ref().chars().collect()).collect(),
            ..Self::new()
        }
    }

    /// Replace the whole content (reload, format). Cursor is clamped, the
    /// selection cleared, and the next parse forced to be full.
    pub fn replace_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(|l| l.chars().collect()).collect();
        self.cursor = self.clamp(self.cursor);
        self.selection = Selection::default();
        self.pending = PendingEdit::Reparse;
    }

    /// Lines joined with `\n`.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.len_bytes());
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.extend(line.iter());
        }
        out
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, row: usize) -> Option<&[char]> {
        self.lines.get(row).map(|l| l.as_slice())
    }

    pub fn line_string(&self, row: usize) -> String {
        self.lines
            .get(row)
            .map(|l| l.iter().collect())
            .unwrap_or_default()
    }

    /// Line length in code points (0 for out-of-range rows).
    pub fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, |l| l.len())
    }

    pub fn char_at(&self, pos: Position) -> Option<char> {
        self.lines.get(pos.row).and_then(|l| l.get(pos.col)).copied()
    }

    /// Total UTF-8 length including `\n` separators.
    pub fn len_bytes(&self) -> usize {
        self.lines.iter().map(|l| utf8_len(l)).sum::<usize>() + self.lines.len() - 1
    }

    pub fn last_position(&self) -> Position {
        let row = self.lines.len() - 1;
        Position::new(row, self.lines[row].len())
    }

    /// Clamp a position into the document.
    pub fn clamp(&self, pos: Position) -> Position {
        let row = pos.row.min(self.lines.len() - 1);
        Position::new(row, pos.col.min(self.lines[row].len()))
    }

    /// Leading whitespace of a line.
    pub fn indent_of(&self, row: usize) -> String {
        self.lines
            .get(row)
            .map(|l| l.iter().take_while(|c| **c == ' ' || **c == '\t').collect())
            .unwrap_or_default()
    }

    // ----- cursor & selection -------------------------------------------------

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Move the cursor; the target is clamped into the document.
    pub fn set_cursor(&mut self, pos: Position) {
        self.cursor = self.clamp(pos);
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Install a selection. Endpoints are clamped.
    pub fn set_selection(&mut self, sel: Selection) {
        self.selection = Selection {
            anchor: self.clamp(sel.anchor),
            head: self.clamp(sel.head),
            active: sel.active,
        };
    }

    pub fn clear_selection(&mut self) {
        self.selection.active = false;
    }

    /// Active, non-empty selection range.
    pub fn selection_range(&self) -> Option<(Position, Position)> {
        if self.selection.is_empty() {
            None
        } else {
            Some(self.selection.normalized())
        }
    }

    // ----- coordinates --------------------------------------------------------

    /// Byte column of `pos` within its line.
    pub fn byte_col(&self, pos: Position) -> usize {
        self.lines
            .get(pos.row)
            .map_or(0, |l| utf8_len(&l[..pos.col.min(l.len())]))
    }

    /// Absolute byte offset of `pos`.
    pub fn byte_offset(&self, pos: Position) -> usize {
        let row = pos.row.min(self.lines.len() - 1);
        let before: usize = self.lines[..row].iter().map(|l| utf8_len(l) + 1).sum();
        before + self.byte_col(Position::new(row, pos.col))
    }

    pub fn point(&self, pos: Position) -> Point {
        Point {
            row: pos.row,
            column: self.byte_col(pos),
        }
    }

    /// Text in `[start, end)` as lines. A range ending at column 0 of a row
    /// produces a trailing empty string (the newline itself).
    pub fn text_in_range(&self, start: Position, end: Position) -> Vec<String> {
        let start = self.clamp(start);
        let end = self.clamp(end);
        if start >= end {
            return Vec::new();
        }
        if start.row == end.row {
            return vec![self.lines[start.row][start.col..end.col].iter().collect()];
        }
        let mut out = Vec::with_capacity(end.row - start.row + 1);
        out.push(self.lines[start.row][start.col..].iter().collect());
        for row in start.row + 1..end.row {
            out.push(self.lines[row].iter().collect());
        }
        out.push(self.lines[end.row][..end.col].iter().collect());
        out
    }

    // ----- pending edit slot --------------------------------------------------

    fn record_edit(&mut self, edit: TextEdit) {
        self.pending = match self.pending {
            PendingEdit::Clean => PendingEdit::Incremental(edit),
            _ => PendingEdit::Reparse,
        };
        tracing::trace!(
            target: "text.edit",
            start = edit.start_byte,
            old_end = edit.old_end_byte,
            new_end = edit.new_end_byte,
            incremental = matches!(self.pending, PendingEdit::Incremental(_)),
            "record_edit"
        );
    }

    /// Consume the pending delta, leaving the slot clean.
    pub fn take_pending_edit(&mut self) -> PendingEdit {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_edit(&self) -> PendingEdit {
        self.pending
    }

    /// Force the next parse to be a full one.
    pub fn invalidate_edit(&mut self) {
        self.pending = PendingEdit::Reparse;
    }

    // ----- primitives ---------------------------------------------------------

    /// Insert one code point. Newlines are rejected (use [`split_line`]).
    ///
    /// [`split_line`]: TextBuffer::split_line
    pub fn insert_rune(&mut self, pos: Position, r: char) -> bool {
        if r == '\n' {
            return false;
        }
        let pos = self.clamp(pos);
        let start_byte = self.byte_offset(pos);
        let start_point = self.point(pos);
        let n = r.len_utf8();
        self.lines[pos.row].insert(pos.col, r);
        self.cursor = Position::new(pos.row, pos.col + 1);
        self.record_edit(TextEdit {
            start_byte,
            old_end_byte: start_byte,
            new_end_byte: start_byte + n,
            start_point,
            old_end_point: start_point,
            new_end_point: Point {
                row: pos.row,
                column: start_point.column + n,
            },
        });
        true
    }

    /// Remove the code point at `pos`. `None` when `pos` is at or past the end
    /// of its line.
    pub fn delete_rune(&mut self, pos: Position) -> Option<char> {
        let pos = self.clamp(pos);
        if pos.col >= self.lines[pos.row].len() {
            return None;
        }
        let start_byte = self.byte_offset(pos);
        let start_point = self.point(pos);
        let r = self.lines[pos.row].remove(pos.col);
        let n = r.len_utf8();
        self.cursor = pos;
        self.record_edit(TextEdit {
            start_byte,
            old_end_byte: start_byte + n,
            new_end_byte: start_byte,
            start_point,
            old_end_point: Point {
                row: pos.row,
                column: start_point.column + n,
            },
            new_end_point: start_point,
        });
        Some(r)
    }

    /// Split the line at `pos`; the right half becomes row `pos.row + 1`.
    pub fn split_line(&mut self, pos: Position) -> bool {
        let pos = self.clamp(pos);
        let start_byte = self.byte_offset(pos);
        let start_point = self.point(pos);
        let right = self.lines[pos.row].split_off(pos.col);
        self.lines.insert(pos.row + 1, right);
        self.cursor = Position::new(pos.row + 1, 0);
        self.record_edit(TextEdit {
            start_byte,
            old_end_byte: start_byte,
            new_end_byte: start_byte + 1,
            start_point,
            old_end_point: start_point,
            new_end_point: Point {
                row: pos.row + 1,
                column: 0,
            },
        });
        true
    }

    /// Append row `pos.row + 1` onto row `pos.row`. The cursor settles at `pos`.
    pub fn join_line(&mut self, pos: Position) -> bool {
        if pos.row + 1 >= self.lines.len() {
            return false;
        }
        let join_at = Position::new(pos.row, self.lines[pos.row].len());
        let start_byte = self.byte_offset(join_at);
        let start_point = self.point(join_at);
        let next = self.lines.remove(pos.row + 1);
        self.lines[pos.row].extend(next);
        self.cursor = self.clamp(pos);
        self.record_edit(TextEdit {
            start_byte,
            old_end_byte: start_byte + 1,
            new_end_byte: start_byte,
            start_point,
            old_end_point: Point {
                row: pos.row + 1,
                column: 0,
            },
            new_end_point: start_point,
        });
        true
    }

    /// Insert `text` (already split on newlines) at `pos`. Returns the end
    /// position, where the cursor is left.
    pub fn insert_text<S: AsRef<str>>(&mut self, pos: Position, text: &[S]) -> Position {
        let pos = self.clamp(pos);
        if text.is_empty() || (text.len() == 1 && text[0].as_ref().is_empty()) {
            return pos;
        }
        let start_byte = self.byte_offset(pos);
        let start_point = self.point(pos);
        let tail = self.lines[pos.row].split_off(pos.col);
        let mut inserted_bytes = 0;
        let mut row = pos.row;
        for (i, piece) in text.iter().enumerate() {
            let piece: Vec<char> = piece.as_ref().chars().collect();
            inserted_bytes += utf8_len(&piece);
            if i == 0 {
                self.lines[row].extend(piece);
            } else {
                inserted_bytes += 1;
                row += 1;
                self.lines.insert(row, piece);
            }
        }
        let end = Position::new(row, self.lines[row].len());
        let end_column = self.byte_col(end);
        self.lines[row].extend(tail);
        self.cursor = end;
        self.record_edit(TextEdit {
            start_byte,
            old_end_byte: start_byte,
            new_end_byte: start_byte + inserted_bytes,
            start_point,
            old_end_point: start_point,
            new_end_point: Point {
                row,
                column: end_column,
            },
        });
        end
    }

    /// Delete `[start, end)` and return the removed text as lines (same shape
    /// [`insert_text`] accepts). The cursor settles at `start`.
    ///
    /// [`insert_text`]: TextBuffer::insert_text
    pub fn delete_text_range(&mut self, start: Position, end: Position) -> Vec<String> {
        let start = self.clamp(start);
        let end = self.clamp(end);
        if start >= end {
            return Vec::new();
        }
        let removed = self.text_in_range(start, end);
        let start_byte = self.byte_offset(start);
        let old_end_byte = self.byte_offset(end);
        let start_point = self.point(start);
        let old_end_point = self.point(end);
        let tail = self.lines[end.row].split_off(end.col);
        self.lines[start.row].truncate(start.col);
        self.lines.drain(start.row + 1..=end.row);
        self.lines[start.row].extend(tail);
        self.cursor = start;
        self.record_edit(TextEdit {
            start_byte,
            old_end_byte,
            new_end_byte: start_byte,
            start_point,
            old_end_point,
            new_end_point: start_point,
        });
        removed
    }

    /// Swap two rows. The delta covers the block between them.
    pub fn swap_lines(&mut self, a: usize, b: usize) -> bool {
        let n = self.lines.len();
        if a >= n || b >= n || a == b {
            return false;
        }
        let (lo, hi) = (a.min(b), a.max(b));
        let start = Position::new(lo, 0);
        let start_byte = self.byte_offset(start);
        let old_end = Position::new(hi, self.lines[hi].len());
        let old_end_byte = self.byte_offset(old_end);
        let old_end_point = self.point(old_end);
        self.lines.swap(a, b);
        let new_end_point = Point {
            row: hi,
            column: utf8_len(&self.lines[hi]),
        };
        self.record_edit(TextEdit {
            start_byte,
            old_end_byte,
            new_end_byte: old_end_byte,
            start_point: Point { row: lo, column: 0 },
            old_end_point,
            new_end_point,
        });
        true
    }

    /// Move row `from` to `to` (adjacent rows) and follow it with the cursor.
    pub fn move_line(&mut self, from: usize, to: usize) -> bool {
        if !self.swap_lines(from, to) {
            return false;
        }
        let col = self.cursor.col;
        self.cursor = self.clamp(Position::new(to, col));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(b: &TextBuffer) -> Vec<String> {
        (0..b.line_count()).map(|r| b.line_string(r)).collect()
    }

    #[test]
    fn empty_document_has_one_line() {
        let b = TextBuffer::from_text("");
        assert_eq!(b.line_count(), 1);
        assert_eq!(b.line_len(0), 0);
        assert_eq!(b.len_bytes(), 0);
    }

    #[test]
    fn insert_rune_emits_byte_delta() {
        let mut b = TextBuffer::from_text("aé");
        assert!(b.insert_rune(Position::new(0, 2), 'ü'));
        assert_eq!(b.line_string(0), "aéü");
        assert_eq!(b.cursor(), Position::new(0, 3));
        let PendingEdit::Incremental(e) = b.take_pending_edit() else {
            panic!("expected incremental edit");
        };
        assert_eq!(e.start_byte, 3);
        assert_eq!(e.old_end_byte, 3);
        assert_eq!(e.new_end_byte, 5);
        assert_eq!(e.new_end_point, Point { row: 0, column: 5 });
        assert_eq!(b.take_pending_edit(), PendingEdit::Clean);
    }

    #[test]
    fn second_mutation_forces_reparse() {
        let mut b = TextBuffer::new();
        b.insert_rune(Position::new(0, 0), 'a');
        b.insert_rune(Position::new(0, 1), 'b');
        assert_eq!(b.take_pending_edit(), PendingEdit::Reparse);
    }

    #[test]
    fn insert_then_delete_restores() {
        let mut b = TextBuffer::from_text("héllo\nworld");
        let before = b.to_text();
        let pos = Position::new(0, 2);
        b.set_cursor(pos);
        b.insert_rune(pos, '∂');
        assert_eq!(b.delete_rune(pos), Some('∂'));
        assert_eq!(b.to_text(), before);
        assert_eq!(b.cursor(), pos);
    }

    #[test]
    fn split_then_join_restores() {
        let mut b = TextBuffer::from_text("abcd\nef");
        let pos = Position::new(0, 2);
        b.set_cursor(pos);
        assert!(b.split_line(pos));
        assert_eq!(lines(&b), vec!["ab", "cd", "ef"]);
        assert_eq!(b.cursor(), Position::new(1, 0));
        assert!(b.join_line(pos));
        assert_eq!(b.to_text(), "abcd\nef");
        assert_eq!(b.cursor(), pos);
    }

    #[test]
    fn join_on_last_row_fails() {
        let mut b = TextBuffer::from_text("a\nb");
        assert!(!b.join_line(Position::new(1, 1)));
        assert_eq!(b.pending_edit(), PendingEdit::Clean);
    }

    #[test]
    fn delete_rune_at_eol_is_none() {
        let mut b = TextBuffer::from_text("ab");
        assert_eq!(b.delete_rune(Position::new(0, 2)), None);
    }

    #[test]
    fn insert_and_delete_multiline_text() {
        let mut b = TextBuffer::from_text("hello world");
        let end = b.insert_text(Position::new(0, 5), &[",", "big"]);
        assert_eq!(lines(&b), vec!["hello,", "big world"]);
        assert_eq!(end, Position::new(1, 3));
        assert_eq!(b.cursor(), end);
        let PendingEdit::Incremental(e) = b.take_pending_edit() else {
            panic!("expected incremental edit");
        };
        assert_eq!(e.new_end_byte - e.start_byte, ",\nbig".len());
        assert_eq!(e.new_end_point, Point { row: 1, column: 3 });

        let removed = b.delete_text_range(Position::new(0, 5), end);
        assert_eq!(removed, vec![",".to_string(), "big".to_string()]);
        assert_eq!(lines(&b), vec!["hello world"]);
        assert_eq!(b.cursor(), Position::new(0, 5));
    }

    #[test]
    fn delete_range_covering_newline() {
        let mut b = TextBuffer::from_text("ab\ncd\nef");
        let removed = b.delete_text_range(Position::new(0, 0), Position::new(1, 0));
        assert_eq!(removed, vec!["ab".to_string(), String::new()]);
        assert_eq!(lines(&b), vec!["cd", "ef"]);
        b.insert_text(Position::new(0, 0), &removed);
        assert_eq!(lines(&b), vec!["ab", "cd", "ef"]);
    }

    #[test]
    fn move_line_follows_cursor() {
        let mut b = TextBuffer::from_lines(&["a", "b", "c"]);
        b.set_cursor(Position::new(1, 0));
        assert!(b.move_line(1, 0));
        assert_eq!(lines(&b), vec!["b", "a", "c"]);
        assert_eq!(b.cursor(), Position::new(0, 0));
        assert!(!b.move_line(0, 3));
    }

    #[test]
    fn byte_offsets_count_separators() {
        let b = TextBuffer::from_text("ä\nbc");
        assert_eq!(b.byte_offset(Position::new(1, 1)), 4);
        assert_eq!(b.point(Position::new(0, 1)), Point { row: 0, column: 2 });
    }

    #[test]
    fn selection_normalizes() {
        let s = Selection::new(Position::new(2, 1), Position::new(0, 4));
        assert_eq!(s.normalized(), (Position::new(0, 4), Position::new(2, 1)));
    }
}
