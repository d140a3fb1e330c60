//! Terminal screen abstraction and its crossterm implementation.
//!
//! The renderer paints into a [`Screen`]: a grid of cells addressed by
//! `(x, y)` with `(0, 0)` in the top-left corner. Nothing reaches the real
//! terminal until [`Screen::flush`]; the crossterm screen keeps the last
//! flushed grid and only emits cells that changed.
//!
//! [`GridScreen`] is the same grid without a terminal behind it. Tests paint
//! into it and read rows back as strings.

use anyhow::Result;

mod crossterm_screen;
mod grid;

pub use crossterm::style::Color;
pub use crossterm_screen::CrosstermScreen;
pub use grid::{Cell, CellGrid, GridScreen};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Attrs: u8 {
        const BOLD      = 0b0000_0001;
        const ITALIC    = 0b0000_0010;
        const UNDERLINE = 0b0000_0100;
        const REVERSE   = 0b0000_1000;
        const DIM       = 0b0001_0000;
    }
}

/// Colors and attributes of one cell. `None` colors use the terminal default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub attrs: Attrs,
}

impl Style {
    pub const fn new() -> Self {
        Self {
            fg: None,
            bg: None,
            attrs: Attrs::empty(),
        }
    }

    pub const fn fg(mut self, c: Color) -> Self {
        self.fg = Some(c);
        self
    }

    pub const fn bg(mut self, c: Color) -> Self {
        self.bg = Some(c);
        self
    }

    pub const fn attrs(mut self, a: Attrs) -> Self {
        self.attrs = a;
        self
    }

    /// `self` with every field `over` sets taken from `over`.
    pub fn patch(self, over: Style) -> Style {
        Style {
            fg: over.fg.or(self.fg),
            bg: over.bg.or(self.bg),
            attrs: self.attrs | over.attrs,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Block,
    Bar,
    Underline,
}

/// Cell-grid terminal the renderer draws on.
pub trait Screen {
    /// `(columns, rows)`.
    fn size(&self) -> (u16, u16);
    /// Terminal resized; the grid is reallocated and the next flush repaints
    /// everything.
    fn resize(&mut self, cols: u16, rows: u16);
    /// Reset every cell to a blank with the default style.
    fn clear(&mut self);
    /// Put `ch` at `(x, y)`. Wide characters also claim the next cell.
    /// Out-of-range positions are ignored.
    fn set_content(&mut self, x: u16, y: u16, ch: char, style: Style);
    fn show_cursor(&mut self, x: u16, y: u16);
    fn hide_cursor(&mut self);
    fn set_cursor_style(&mut self, shape: CursorShape);
    fn enable_mouse(&mut self) -> Result<()>;
    /// Make the painted grid visible.
    fn flush(&mut self) -> Result<()>;
    /// Restore the terminal. Safe to call more than once.
    fn finalize(&mut self) -> Result<()>;

    /// Paint `text` from `(x, y)` rightward, stopping at the screen edge.
    /// Returns the column after the last cell written.
    fn put_str(&mut self, x: u16, y: u16, text: &str, style: Style) -> u16 {
        let (cols, _) = self.size();
        let mut col = x;
        for ch in text.chars() {
            let w = grid::cell_width(ch) as u16;
            if col.saturating_add(w) > cols {
                break;
            }
            self.set_content(col, y, ch, style);
            col += w;
        }
        col
    }

    /// Blank `[x, cols)` on row `y`.
    fn fill_row(&mut self, x: u16, y: u16, style: Style) {
        let (cols, _) = self.size();
        for col in x..cols {
            self.set_content(col, y, ' ', style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_prefers_overlay_fields() {
        let base = Style::new().fg(Color::Blue).attrs(Attrs::BOLD);
        let sel = Style::new().bg(Color::DarkGrey).attrs(Attrs::UNDERLINE);
        let out = base.patch(sel);
        assert_eq!(out.fg, Some(Color::Blue));
        assert_eq!(out.bg, Some(Color::DarkGrey));
        assert_eq!(out.attrs, Attrs::BOLD | Attrs::UNDERLINE);
    }

    #[test]
    fn put_str_clips_at_the_edge() {
        let mut s = GridScreen::new(5, 1);
        let end = s.put_str(2, 0, "abcdef", Style::default());
        assert_eq!(end, 5);
        assert_eq!(s.row_text(0), "  abc");
    }
}
