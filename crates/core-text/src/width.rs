//! Display width of code points in terminal cells.
//!
//! All width decisions for rendering and mouse hit-testing flow through
//! [`char_width`] so tabs and control characters are treated the same
//! everywhere.

use unicode_width::UnicodeWidthChar;

/// Cells a tab occupies.
pub const TAB_WIDTH: usize = 4;

/// Width of one code point. Tabs expand to [`TAB_WIDTH`]; control characters
/// take one cell (they are painted as a placeholder).
pub fn char_width(c: char) -> usize {
    if c == '\t' {
        return TAB_WIDTH;
    }
    c.width().unwrap_or(1)
}

/// Cells occupied by `line[..col]`.
pub fn display_col(line: &[char], col: usize) -> usize {
    line.iter().take(col).map(|c| char_width(*c)).sum()
}

/// Inverse of [`display_col`]: the code-point column whose cell span
/// contains `cells`, clamped to the line length.
pub fn col_at_cells(line: &[char], cells: usize) -> usize {
    let mut acc = 0;
    for (i, c) in line.iter().enumerate() {
        let w = char_width(*c);
        if acc + w > cells {
            return i;
        }
        acc += w;
    }
    line.len()
}
