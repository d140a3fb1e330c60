//! Colors for every painted element.

use core_syntax::HighlightKind;
use core_terminal::{Attrs, Color, Style};

use crate::style::StyleAttr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub text: Style,
    pub gutter: Style,
    pub gutter_current: Style,
    pub filler: Style,
    pub control: Style,
    pub selection: Style,
    pub search_match: Style,
    pub matched_char: Style,
    pub current_match: Style,
    pub status: Style,
    pub status_mode: Style,
    pub prompt: Style,
    pub menu: Style,
    pub menu_title: Style,
    pub menu_planned: Style,
    pub picker_selected: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: Style::new(),
            gutter: Style::new().fg(Color::DarkGrey),
            gutter_current: Style::new().fg(Color::Yellow),
            filler: Style::new().fg(Color::DarkBlue),
            control: Style::new().fg(Color::DarkGrey),
            selection: Style::new().bg(Color::DarkGrey),
            search_match: Style::new().fg(Color::Black).bg(Color::DarkYellow),
            matched_char: Style::new()
                .fg(Color::Black)
                .bg(Color::DarkYellow)
                .attrs(Attrs::BOLD.union(Attrs::UNDERLINE)),
            current_match: Style::new().fg(Color::Black).bg(Color::Yellow),
            status: Style::new().fg(Color::White).bg(Color::DarkBlue),
            status_mode: Style::new()
                .fg(Color::White)
                .bg(Color::DarkBlue)
                .attrs(Attrs::BOLD),
            prompt: Style::new(),
            menu: Style::new().fg(Color::White).bg(Color::DarkGrey),
            menu_title: Style::new()
                .fg(Color::Yellow)
                .bg(Color::DarkGrey)
                .attrs(Attrs::BOLD),
            menu_planned: Style::new()
                .fg(Color::Grey)
                .bg(Color::DarkGrey)
                .attrs(Attrs::DIM),
            picker_selected: Style::new()
                .fg(Color::White)
                .bg(Color::DarkGrey)
                .attrs(Attrs::REVERSE),
        }
    }
}

impl Theme {
    pub fn syntax(&self, kind: HighlightKind) -> Style {
        let fg = match kind {
            HighlightKind::Keyword => Color::Magenta,
            HighlightKind::String => Color::Green,
            HighlightKind::Comment => Color::DarkGrey,
            HighlightKind::Type => Color::Yellow,
            HighlightKind::Function => Color::Blue,
            HighlightKind::Number | HighlightKind::Constant => Color::DarkYellow,
            HighlightKind::Operator | HighlightKind::Punctuation => Color::Grey,
            HighlightKind::Field | HighlightKind::Parameter => Color::Cyan,
            HighlightKind::Builtin => Color::Red,
            HighlightKind::Variable => Color::Reset,
        };
        let style = self.text.fg(fg);
        match kind {
            HighlightKind::Comment => style.attrs(Attrs::ITALIC),
            HighlightKind::Keyword => style.attrs(Attrs::BOLD),
            _ => style,
        }
    }

    /// Overlay style; its set fields replace the syntax style underneath.
    pub fn overlay(&self, attr: StyleAttr) -> Style {
        match attr {
            StyleAttr::Match => self.search_match,
            StyleAttr::MatchedChar => self.matched_char,
            StyleAttr::CurrentMatch => self.current_match,
            StyleAttr::Selection => self.selection,
        }
    }
}
