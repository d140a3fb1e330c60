//! Crossterm-backed [`Screen`].
//!
//! Paints go to a back grid. `flush` compares it with the grid flushed last
//! time and queues `MoveTo` / `SetStyle` / `Print` only for changed cells,
//! then writes everything in one `Write::flush`. A resize or `clear` after
//! finalize forces a full repaint.

use std::io::{Stdout, Write, stdout};

use anyhow::Result;
use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
        disable_raw_mode, enable_raw_mode,
    },
};
use tracing::{debug, trace};

use crate::grid::CellGrid;
use crate::{Attrs, CursorShape, Screen, Style};

pub struct CrosstermScreen {
    out: Stdout,
    back: CellGrid,
    /// Grid as last written to the terminal; `None` forces a full repaint.
    front: Option<CellGrid>,
    cursor: Option<(u16, u16)>,
    shape: CursorShape,
    mouse: bool,
    active: bool,
}

impl CrosstermScreen {
    /// Enter raw mode and the alternate screen. The terminal is restored by
    /// [`Screen::finalize`] or on drop.
    pub fn enter(title: &str) -> Result<Self> {
        let mut out = stdout();
        enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, cursor::Hide, SetTitle(title))?;
        let (cols, rows) = terminal::size()?;
        debug!(target: "runtime", cols, rows, "terminal entered");
        Ok(Self {
            out,
            back: CellGrid::new(cols, rows),
            front: None,
            cursor: None,
            shape: CursorShape::default(),
            mouse: false,
            active: true,
        })
    }

    fn queue_style(&mut self, style: Style) -> std::io::Result<()> {
        queue!(self.out, SetAttribute(Attribute::Reset), ResetColor)?;
        if let Some(fg) = style.fg {
            queue!(self.out, SetForegroundColor(fg))?;
        }
        if let Some(bg) = style.bg {
            queue!(self.out, SetBackgroundColor(bg))?;
        }
        for (flag, attr) in [
            (Attrs::BOLD, Attribute::Bold),
            (Attrs::ITALIC, Attribute::Italic),
            (Attrs::UNDERLINE, Attribute::Underlined),
            (Attrs::REVERSE, Attribute::Reverse),
            (Attrs::DIM, Attribute::Dim),
        ] {
            if style.attrs.contains(flag) {
                queue!(self.out, SetAttribute(attr))?;
            }
        }
        Ok(())
    }

    fn queue_cursor_shape(&mut self) -> std::io::Result<()> {
        let shape = match self.shape {
            CursorShape::Block => cursor::SetCursorStyle::SteadyBlock,
            CursorShape::Bar => cursor::SetCursorStyle::SteadyBar,
            CursorShape::Underline => cursor::SetCursorStyle::SteadyUnderScore,
        };
        queue!(self.out, shape)
    }
}

impl Screen for CrosstermScreen {
    fn size(&self) -> (u16, u16) {
        (self.back.width(), self.back.height())
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.back = CellGrid::new(cols, rows);
        self.front = None;
    }

    fn clear(&mut self) {
        self.back.clear();
    }

    fn set_content(&mut self, x: u16, y: u16, ch: char, style: Style) {
        self.back.set(x, y, ch, style);
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
        if !self.mouse {
            execute!(self.out, EnableMouseCapture)?;
            self.mouse = true;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        queue!(self.out, cursor::Hide)?;
        let full = self.front.is_none();
        if full {
            queue!(self.out, SetAttribute(Attribute::Reset), Clear(ClearType::All))?;
        }
        let mut written = 0usize;
        let mut current: Option<Style> = None;
        let mut at: Option<(u16, u16)> = None;
        for y in 0..self.back.height() {
            for x in 0..self.back.width() {
                let Some(cell) = self.back.get(x, y).copied() else {
                    continue;
                };
                if cell.continuation {
                    continue;
                }
                let unchanged = self
                    .front
                    .as_ref()
                    .and_then(|f| f.get(x, y))
                    .is_some_and(|old| *old == cell);
                if unchanged {
                    continue;
                }
                if at != Some((x, y)) {
                    queue!(self.out, MoveTo(x, y))?;
                }
                if current != Some(cell.style) {
                    self.queue_style(cell.style)?;
                    current = Some(cell.style);
                }
                let ch = if cell.ch.is_control() { ' ' } else { cell.ch };
                queue!(self.out, Print(ch))?;
                let w = crate::grid::cell_width(ch) as u16;
                at = Some((x + w, y));
                written += 1;
            }
        }
        queue!(self.out, SetAttribute(Attribute::Reset), ResetColor)?;
        if let Some((x, y)) = self.cursor {
            queue!(self.out, MoveTo(x, y))?;
            self.queue_cursor_shape()?;
            queue!(self.out, cursor::Show)?;
        }
        self.out.flush()?;
        trace!(target: "runtime", full, cells = written, "flushed");
        self.front = Some(self.back.clone());
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        if self.mouse {
            execute!(self.out, DisableMouseCapture)?;
            self.mouse = false;
        }
        execute!(
            self.out,
            SetAttribute(Attribute::Reset),
            ResetColor,
            cursor::SetCursorStyle::DefaultUserShape,
            LeaveAlternateScreen,
            cursor::Show
        )?;
        disable_raw_mode()?;
        debug!(target: "runtime", "terminal restored");
        Ok(())
    }
}

impl Drop for CrosstermScreen {
    fn drop(&mut self) {
        let _ = self.finalize();
    }
}
