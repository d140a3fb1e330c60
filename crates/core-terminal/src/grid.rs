//! In-memory cell grid.

use anyhow::Result;
use unicode_width::UnicodeWidthChar;

use crate::{CursorShape, Screen, Style};

/// Cells a character occupies on screen. Control characters and tabs are
/// painted by the caller as single cells.
pub(crate) fn cell_width(ch: char) -> usize {
    ch.width().unwrap_or(1).max(1)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
    /// Right half of a wide character; never printed.
    pub continuation: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: Style::default(),
            continuation: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellGrid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl CellGrid {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); usize::from(width) * usize::from(height)],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    pub fn set(&mut self, x: u16, y: u16, ch: char, style: Style) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let wide = cell_width(ch) > 1;
        if wide && x + 1 >= self.width {
            // No room for the right half.
            self.cells[i] = Cell {
                ch: ' ',
                style,
                continuation: false,
            };
            return;
        }
        self.cells[i] = Cell {
            ch,
            style,
            continuation: false,
        };
        if wide {
            self.cells[i + 1] = Cell {
                ch: ' ',
                style,
                continuation: true,
            };
        }
    }

    /// Characters of row `y`, continuation cells skipped.
    pub fn row_text(&self, y: u16) -> String {
        (0..self.width)
            .filter_map(|x| self.get(x, y))
            .filter(|c| !c.continuation)
            .map(|c| c.ch)
            .collect()
    }
}

/// A [`Screen`] that only records what was painted.
#[derive(Debug, Clone)]
pub struct GridScreen {
    grid: CellGrid,
    cursor: Option<(u16, u16)>,
    shape: CursorShape,
    flushes: usize,
}

impl GridScreen {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            grid: CellGrid::new(cols, rows),
            cursor: None,
            shape: CursorShape::default(),
            flushes: 0,
        }
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    pub fn row_text(&self, y: u16) -> String {
        self.grid.row_text(y)
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.grid.get(x, y)
    }

    pub fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    pub fn cursor_shape(&self) -> CursorShape {
        self.shape
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Screen for GridScreen {
    fn size(&self) -> (u16, u16) {
        (self.grid.width(), self.grid.height())
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.grid = CellGrid::new(cols, rows);
    }

    fn clear(&mut self) {
        self.grid.clear();
    }

    fn set_content(&mut self, x: u16, y: u16, ch: char, style: Style) {
        self.grid.set(x, y, ch, style);
    }

    fn show_cursor(&mut self, x: u16, y: u16) {
        self.cursor = Some((x, y));
    }

    fn hide_cursor(&mut self) {
        self.cursor = None;
    }

    fn set_cursor_style(&mut self, shape: CursorShape) {
        self.shape = shape;
    }

    fn enable_mouse(&mut self) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
