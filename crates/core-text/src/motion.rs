//! Cursor motions.
//!
//! Pure functions over a [`TextBuffer`] and a [`Position`]; none of them
//! mutate the document. Word motions classify code points into
//! [`CharClass`] runs: letters, digits and `_` form words, whitespace and
//! punctuation are separate classes.

use crate::{Position, TextBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Word,
    Punct,
    Space,
}

pub fn char_class(c: char) -> CharClass {
    if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else if c.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Punct
    }
}

pub fn left(_buf: &TextBuffer, pos: Position) -> Position {
    Position::new(pos.row, pos.col.saturating_sub(1))
}

pub fn right(buf: &TextBuffer, pos: Position) -> Position {
    Position::new(pos.row, (pos.col + 1).min(buf.line_len(pos.row)))
}

pub fn up(buf: &TextBuffer, pos: Position) -> Position {
    if pos.row == 0 {
        return pos;
    }
    buf.clamp(Position::new(pos.row - 1, pos.col))
}

pub fn down(buf: &TextBuffer, pos: Position) -> Position {
    buf.clamp(Position::new(pos.row + 1, pos.col))
}

pub fn line_start(pos: Position) -> Position {
    Position::new(pos.row, 0)
}

pub fn line_end(buf: &TextBuffer, pos: Position) -> Position {
    Position::new(pos.row, buf.line_len(pos.row))
}

pub fn first_non_blank(buf: &TextBuffer, pos: Position) -> Position {
    let col = buf
        .line(pos.row)
        .and_then(|l| l.iter().position(|c| !c.is_whitespace()))
        .unwrap_or_else(|| buf.line_len(pos.row));
    Position::new(pos.row, col)
}

pub fn doc_start() -> Position {
    Position::new(0, 0)
}

pub fn doc_end(buf: &TextBuffer) -> Position {
    buf.last_position()
}

pub fn page_down(buf: &TextBuffer, pos: Position, height: usize) -> Position {
    buf.clamp(Position::new(pos.row + height.max(1), pos.col))
}

pub fn page_up(buf: &TextBuffer, pos: Position, height: usize) -> Position {
    buf.clamp(Position::new(pos.row.saturating_sub(height.max(1)), pos.col))
}

/// Start of the next word run. Crosses to the next line at end of line.
pub fn word_right(buf: &TextBuffer, pos: Position) -> Position {
    let Some(line) = buf.line(pos.row) else {
        return pos;
    };
    if pos.col >= line.len() {
        if pos.row + 1 < buf.line_count() {
            return first_non_blank(buf, Position::new(pos.row + 1, 0));
        }
        return pos;
    }
    let class = char_class(line[pos.col]);
    let mut col = pos.col;
    while col < line.len() && char_class(line[col]) == class {
        col += 1;
    }
    while col < line.len() && char_class(line[col]) == CharClass::Space {
        col += 1;
    }
    Position::new(pos.row, col)
}

/// Start of the previous word run. Crosses to the end of the previous line at
/// column 0.
pub fn word_left(buf: &TextBuffer, pos: Position) -> Position {
    if pos.col == 0 {
        if pos.row == 0 {
            return pos;
        }
        return line_end(buf, Position::new(pos.row - 1, 0));
    }
    let Some(line) = buf.line(pos.row) else {
        return pos;
    };
    let mut col = pos.col.min(line.len());
    while col > 0 && char_class(line[col - 1]) == CharClass::Space {
        col -= 1;
    }
    if col == 0 {
        return Position::new(pos.row, 0);
    }
    let class = char_class(line[col - 1]);
    while col > 0 && char_class(line[col - 1]) == class {
        col -= 1;
    }
    Position::new(pos.row, col)
}

/// `e`: last code point of the current or next word run.
pub fn word_end(buf: &TextBuffer, pos: Position) -> Position {
    let Some(line) = buf.line(pos.row) else {
        return pos;
    };
    if pos.col + 1 >= line.len() {
        if pos.row + 1 < buf.line_count() {
            return word_end_from(buf, Position::new(pos.row + 1, 0));
        }
        return line_end(buf, pos);
    }
    word_end_from(buf, Position::new(pos.row, pos.col + 1))
}

fn word_end_from(buf: &TextBuffer, pos: Position) -> Position {
    let line = buf.line(pos.row).unwrap_or(&[]);
    let mut col = pos.col;
    while col < line.len() && char_class(line[col]) == CharClass::Space {
        col += 1;
    }
    if col >= line.len() {
        return Position::new(pos.row, line.len());
    }
    let class = char_class(line[col]);
    while col + 1 < line.len() && char_class(line[col + 1]) == class {
        col += 1;
    }
    Position::new(pos.row, col)
}

fn is_cross_line_target(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>' | '"' | '\'' | '`'
    )
}

/// `f`/`F`/`t`/`T`. Searches the current line, or the whole document in the
/// given direction for brackets and quotes. `till` stops one short.
pub fn find_char(
    buf: &TextBuffer,
    pos: Position,
    target: char,
    forward: bool,
    till: bool,
) -> Option<Position> {
    let cross = is_cross_line_target(target);
    let found = if forward {
        find_forward(buf, pos, target, cross)
    } else {
        find_backward(buf, pos, target, cross)
    }?;
    if !till {
        return Some(found);
    }
    let adjusted = if forward {
        if found.row == pos.row {
            Position::new(found.row, found.col.saturating_sub(1).max(pos.col))
        } else {
            Position::new(found.row, found.col.saturating_sub(1))
        }
    } else if found.row == pos.row {
        Position::new(found.row, (found.col + 1).min(pos.col))
    } else {
        Position::new(found.row, (found.col + 1).min(buf.line_len(found.row)))
    };
    Some(adjusted)
}

fn find_forward(buf: &TextBuffer, pos: Position, target: char, cross: bool) -> Option<Position> {
    let last_row = if cross {
        buf.line_count() - 1
    } else {
        pos.row
    };
    for row in pos.row..=last_row {
        let line = buf.line(row)?;
        let from = if row == pos.row { pos.col + 1 } else { 0 };
        if let Some(i) = line.iter().skip(from).position(|c| *c == target) {
            return Some(Position::new(row, from + i));
        }
    }
    None
}

fn find_backward(buf: &TextBuffer, pos: Position, target: char, cross: bool) -> Option<Position> {
    let first_row = if cross { 0 } else { pos.row };
    for row in (first_row..=pos.row).rev() {
        let line = buf.line(row)?;
        let upto = if row == pos.row {
            pos.col.min(line.len())
        } else {
            line.len()
        };
        if let Some(i) = line[..upto].iter().rposition(|c| *c == target) {
            return Some(Position::new(row, i));
        }
    }
    None
}

fn bracket_pair(c: char) -> Option<(char, char, bool)> {
    match c {
        '(' => Some(('(', ')', true)),
        '[' => Some(('[', ']', true)),
        '{' => Some(('{', '}', true)),
        ')' => Some(('(', ')', false)),
        ']' => Some(('[', ']', false)),
        '}' => Some(('{', '}', false)),
        _ => None,
    }
}

/// Bracket matching the one under the cursor, across lines.
pub fn matching_bracket(buf: &TextBuffer, pos: Position) -> Option<Position> {
    let (open, close, forward) = bracket_pair(buf.char_at(pos)?)?;
    let mut depth = 0usize;
    if forward {
        for row in pos.row..buf.line_count() {
            let line = buf.line(row)?;
            let from = if row == pos.row { pos.col } else { 0 };
            for (col, c) in line.iter().enumerate().skip(from) {
                if *c == open {
                    depth += 1;
                } else if *c == close {
                    depth -= 1;
                    if depth == 0 {
                        return Some(Position::new(row, col));
                    }
                }
            }
        }
    } else {
        for row in (0..=pos.row).rev() {
            let line = buf.line(row)?;
            let upto = if row == pos.row { pos.col + 1 } else { line.len() };
            for col in (0..upto).rev() {
                let c = line[col];
                if c == close {
                    depth += 1;
                } else if c == open {
                    depth -= 1;
                    if depth == 0 {
                        return Some(Position::new(row, col));
                    }
                }
            }
        }
    }
    None
}
