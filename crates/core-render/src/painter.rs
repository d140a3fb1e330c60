//! Frame painting: one full pass over the dispatcher's state per frame.
//!
//! Rows `[0, rows - 2)` hold text, `rows - 2` the status line and `rows - 1`
//! the prompt or message line. The screen's own diffing keeps the terminal
//! traffic proportional to what changed.

use anyhow::Result;
use core_actions::{BranchPicker, Dispatcher};
use core_config::LineNumbers;
use core_keymap::MenuKind;
use core_state::Mode;
use core_terminal::{CursorShape, Screen, Style};
use core_text::{Position, width};
use tracing::trace;

use crate::status::{StatusContext, build_status};
use crate::style::{StyleAttr, StyleLayer};
use crate::theme::Theme;

/// Stand-in for control characters.
const CONTROL_GLYPH: char = '\u{00b7}';
/// Marks rows past the end of the document.
const FILLER: char = '~';

#[derive(Debug, Default)]
pub struct Painter {
    theme: Theme,
    layer: StyleLayer,
}

impl Painter {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            layer: StyleLayer::new(),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Paint the whole frame and flush it.
    pub fn render(&mut self, d: &Dispatcher, screen: &mut dyn Screen) -> Result<()> {
        let (cols, rows) = screen.size();
        screen.clear();
        let text_rows = rows.saturating_sub(2);
        let text_rows = text_rows.min(u16::try_from(d.view().height).unwrap_or(u16::MAX));
        self.paint_text(d, screen, text_rows);
        if rows >= 2 {
            self.paint_status(d, screen, rows - 2, cols);
        }
        if rows >= 1 {
            self.paint_prompt(d, screen, rows - 1);
        }
        if let Some(kind) = d.open_menu_kind() {
            self.paint_menu(screen, kind, rows.saturating_sub(2));
        }
        if let Some(picker) = d.picker() {
            self.paint_picker(screen, picker, rows.saturating_sub(2));
        }
        self.place_cursor(d, screen, text_rows);
        trace!(target: "runtime", cols, rows, first_line = d.view().first_line, "frame painted");
        screen.flush()
    }

    fn paint_text(&mut self, d: &Dispatcher, screen: &mut dyn Screen, text_rows: u16) {
        let buf = d.buffer();
        let line_count = buf.line_count();
        let numbers = d.line_numbers();
        let gutter = numbers.gutter_width(line_count);
        let cursor_row = buf.cursor().row;
        let selection = buf.selection_range();
        let (cols, _) = screen.size();

        for y in 0..text_rows {
            let row = d.view().first_line + usize::from(y);
            let Some(line) = buf.line(row) else {
                screen.set_content(0, y, FILLER, self.theme.filler);
                continue;
            };
            self.paint_gutter(screen, y, row, cursor_row, numbers, gutter);

            self.layer.clear();
            if let Some((start, end)) = selection {
                if let Some((a, b)) = selected_cols(start, end, row, line.len()) {
                    self.layer.push(a, b, StyleAttr::Selection);
                }
            }
            let current = d.search().current_index();
            for (i, m) in d.search().matches().iter().enumerate() {
                if m.row == row {
                    self.layer.push_match(m, current == Some(i));
                }
            }

            let mut x = gutter as u16;
            for (col, &ch) in line.iter().enumerate() {
                let w = width::char_width(ch) as u16;
                if x.saturating_add(w) > cols {
                    break;
                }
                let mut style = match d.highlights().style_at(row, col) {
                    Some(kind) => self.theme.syntax(kind),
                    None => self.theme.text,
                };
                if let Some(attr) = self.layer.attr_at(col) {
                    style = style.patch(self.theme.overlay(attr));
                }
                match ch {
                    '\t' => {
                        for i in 0..w {
                            screen.set_content(x + i, y, ' ', style);
                        }
                    }
                    c if c.is_control() => {
                        screen.set_content(x, y, CONTROL_GLYPH, style.patch(self.theme.control));
                    }
                    c => screen.set_content(x, y, c, style),
                }
                x += w;
            }
            // A selection running past the line end covers the newline.
            if x < cols && self.layer.attr_at(line.len()) == Some(StyleAttr::Selection) {
                screen.set_content(x, y, ' ', self.theme.selection);
            }
        }
    }

    fn paint_gutter(
        &self,
        screen: &mut dyn Screen,
        y: u16,
        row: usize,
        cursor_row: usize,
        numbers: LineNumbers,
        gutter: usize,
    ) {
        if gutter == 0 {
            return;
        }
        let number = match numbers {
            LineNumbers::Off => return,
            LineNumbers::Absolute => row + 1,
            LineNumbers::Relative if row == cursor_row => row + 1,
            LineNumbers::Relative => row.abs_diff(cursor_row),
        };
        let style = if row == cursor_row {
            self.theme.gutter_current
        } else {
            self.theme.gutter
        };
        let label = format!("{number:>w$} ", w = gutter - 1);
        screen.put_str(0, y, &label, style);
    }

    fn paint_status(&self, d: &Dispatcher, screen: &mut dyn Screen, y: u16, cols: u16) {
        let cursor = d.buffer().cursor();
        let ctx = StatusContext {
            mode: d.mode(),
            line: cursor.row,
            col: cursor.col,
            file_name: d.path(),
            dirty: d.is_dirty(),
            branch: d.branch(),
            language: d.language().map(|l| l.name()),
            line_ending: d.line_ending(),
            select_mode: d.select_mode(),
        };
        let text = build_status(&ctx, usize::from(cols));
        let mode_len = d.mode().label().chars().count() as u16 + 1;
        screen.fill_row(0, y, self.theme.status);
        screen.put_str(0, y, &text, self.theme.status);
        for x in 0..mode_len.min(cols) {
            if let Some(ch) = text.chars().nth(usize::from(x)) {
                screen.set_content(x, y, ch, self.theme.status_mode);
            }
        }
    }

    fn paint_prompt(&self, d: &Dispatcher, screen: &mut dyn Screen, y: u16) {
        if let Some((label, text)) = d.prompt() {
            let x = screen.put_str(0, y, label, self.theme.prompt);
            screen.put_str(x, y, text, self.theme.prompt);
        } else if let Some(msg) = d.status() {
            screen.put_str(0, y, msg, self.theme.prompt);
        }
    }

    /// Menu box anchored to the bottom-right corner above the status line.
    fn paint_menu(&self, screen: &mut dyn Screen, kind: MenuKind, bottom: u16) {
        let lines: Vec<(String, Style)> = kind
            .items()
            .iter()
            .map(|item| {
                let style = if item.implemented {
                    self.theme.menu
                } else {
                    self.theme.menu_planned
                };
                (format!(" {:<5} {} ", item.key, item.label), style)
            })
            .collect();
        self.paint_box(screen, kind.title(), &lines, bottom);
    }

    fn paint_picker(&self, screen: &mut dyn Screen, picker: &BranchPicker, bottom: u16) {
        let room = usize::from(bottom.saturating_sub(1)).max(1);
        let first = picker.selected.saturating_sub(room - 1);
        let lines: Vec<(String, Style)> = picker
            .branches
            .iter()
            .enumerate()
            .skip(first)
            .take(room)
            .map(|(i, name)| {
                let mark = if picker.current.as_deref() == Some(name.as_str()) {
                    '*'
                } else {
                    ' '
                };
                let style = if i == picker.selected {
                    self.theme.picker_selected
                } else {
                    self.theme.menu
                };
                (format!(" {mark} {name} "), style)
            })
            .collect();
        self.paint_box(screen, "Branches", &lines, bottom);
    }

    fn paint_box(
        &self,
        screen: &mut dyn Screen,
        title: &str,
        lines: &[(String, Style)],
        bottom: u16,
    ) {
        let (cols, _) = screen.size();
        let title = format!(" {title} ");
        let inner = lines
            .iter()
            .map(|(l, _)| l.chars().count())
            .chain(std::iter::once(title.chars().count()))
            .max()
            .unwrap_or(0);
        let w = u16::try_from(inner).unwrap_or(u16::MAX).min(cols);
        let h = u16::try_from(lines.len() + 1).unwrap_or(u16::MAX).min(bottom);
        if w == 0 || h == 0 {
            return;
        }
        let x0 = cols - w;
        let y0 = bottom - h;
        for (i, y) in (y0..bottom).enumerate() {
            let (text, style) = match i {
                0 => (title.as_str(), self.theme.menu_title),
                n => (lines[n - 1].0.as_str(), lines[n - 1].1),
            };
            for x in x0..cols {
                screen.set_content(x, y, ' ', style);
            }
            screen.put_str(x0, y, text, style);
        }
    }

    fn place_cursor(&self, d: &Dispatcher, screen: &mut dyn Screen, text_rows: u16) {
        let (cols, rows) = screen.size();
        match d.mode() {
            Mode::Command | Mode::Search => {
                let cells = d
                    .prompt()
                    .map(|(label, text)| {
                        label.chars().chain(text.chars()).map(width::char_width).sum::<usize>()
                    })
                    .unwrap_or(0);
                let x = u16::try_from(cells).unwrap_or(u16::MAX).min(cols.saturating_sub(1));
                screen.set_cursor_style(CursorShape::Bar);
                screen.show_cursor(x, rows.saturating_sub(1));
            }
            Mode::BranchPicker => screen.hide_cursor(),
            Mode::Normal | Mode::Insert => {
                let buf = d.buffer();
                let Position { row, col } = buf.cursor();
                let Some(y) = row.checked_sub(d.view().first_line) else {
                    screen.hide_cursor();
                    return;
                };
                if y >= usize::from(text_rows) {
                    screen.hide_cursor();
                    return;
                }
                let gutter = d.line_numbers().gutter_width(buf.line_count());
                let cells = gutter + width::display_col(buf.line(row).unwrap_or(&[]), col);
                let x = u16::try_from(cells).unwrap_or(u16::MAX).min(cols.saturating_sub(1));
                let shape = if d.mode() == Mode::Insert {
                    CursorShape::Bar
                } else {
                    CursorShape::Block
                };
                screen.set_cursor_style(shape);
                screen.show_cursor(x, y as u16);
            }
        }
    }
}

/// Columns of `row` inside the half-open selection `[start, end)`, with
/// `len` standing for the newline.
fn selected_cols(start: Position, end: Position, row: usize, len: usize) -> Option<(usize, usize)> {
    if row < start.row || row > end.row {
        return None;
    }
    let a = if row == start.row { start.col } else { 0 };
    let b = if row == end.row { end.col } else { len + 1 };
    (a < b).then_some((a, b))
}
