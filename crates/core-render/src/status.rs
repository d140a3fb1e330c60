//! Status line composition.
//!
//! Two stages: [`compose_status`] turns a [`StatusContext`] into ordered
//! segments, [`format_status`] lays them out for a given width with the
//! left group flush left and the right group flush right. When the row is too
//! narrow the right group is dropped first, then the left group is cut.
//!
//! Layout: ` NORMAL  main.rs*  ⎇ dev  SEL` ... `rust  CRLF  Ln 3, Col 5 `

use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::Path;

use core_state::{LineEnding, Mode};

pub struct StatusContext<'a> {
    pub mode: Mode,
    /// 0-based cursor row.
    pub line: usize,
    /// 0-based cursor column in code points.
    pub col: usize,
    pub file_name: Option<&'a Path>,
    pub dirty: bool,
    pub branch: Option<&'a str>,
    pub language: Option<&'static str>,
    pub line_ending: LineEnding,
    pub select_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSegment<'a> {
    Mode(&'static str),
    /// Base file name or `[No Name]`, with `*` when dirty.
    FileName(Cow<'a, str>),
    Branch(&'a str),
    SelectLatch,
    Language(&'static str),
    LineEnding(&'static str),
    /// 1-based cursor position.
    Position { line_1: usize, col_1: usize },
}

impl StatusSegment<'_> {
    fn right_aligned(&self) -> bool {
        matches!(
            self,
            StatusSegment::Language(_)
                | StatusSegment::LineEnding(_)
                | StatusSegment::Position { .. }
        )
    }

    fn text(&self) -> Cow<'_, str> {
        match self {
            StatusSegment::Mode(m) => Cow::Borrowed(*m),
            StatusSegment::FileName(name) => Cow::Borrowed(name.as_ref()),
            StatusSegment::Branch(b) => Cow::Owned(format!("\u{2387} {b}")),
            StatusSegment::SelectLatch => Cow::Borrowed("SEL"),
            StatusSegment::Language(l) => Cow::Borrowed(*l),
            StatusSegment::LineEnding(e) => Cow::Borrowed(*e),
            StatusSegment::Position { line_1, col_1 } => {
                let mut s = String::with_capacity(16);
                let _ = write!(s, "Ln {line_1}, Col {col_1}");
                Cow::Owned(s)
            }
        }
    }
}

pub fn compose_status<'a>(ctx: &StatusContext<'a>) -> Vec<StatusSegment<'a>> {
    let name: Cow<'a, str> = match ctx.file_name.and_then(|p| p.file_name()) {
        Some(n) => n.to_string_lossy(),
        None => Cow::Borrowed("[No Name]"),
    };
    let name = if ctx.dirty {
        Cow::Owned(format!("{name}*"))
    } else {
        name
    };
    let mut out = Vec::with_capacity(7);
    out.push(StatusSegment::Mode(ctx.mode.label()));
    out.push(StatusSegment::FileName(name));
    if let Some(b) = ctx.branch {
        out.push(StatusSegment::Branch(b));
    }
    if ctx.select_mode {
        out.push(StatusSegment::SelectLatch);
    }
    if let Some(lang) = ctx.language {
        out.push(StatusSegment::Language(lang));
    }
    if ctx.line_ending != LineEnding::Lf {
        let e = match ctx.line_ending {
            LineEnding::Crlf => "CRLF",
            LineEnding::Cr => "CR",
            LineEnding::Lf => "LF",
        };
        out.push(StatusSegment::LineEnding(e));
    }
    out.push(StatusSegment::Position {
        line_1: ctx.line + 1,
        col_1: ctx.col + 1,
    });
    out
}

const GAP: &str = "  ";

fn join(segments: &[StatusSegment<'_>], right: bool) -> String {
    let mut s = String::with_capacity(48);
    for seg in segments.iter().filter(|s| s.right_aligned() == right) {
        if !s.is_empty() {
            s.push_str(GAP);
        }
        s.push_str(&seg.text());
    }
    s
}

/// Lay out `segments` in exactly `width` characters.
pub fn format_status(segments: &[StatusSegment<'_>], width: usize) -> String {
    let left = format!(" {}", join(segments, false));
    let right = format!("{} ", join(segments, true));
    let (lw, rw) = (left.chars().count(), right.chars().count());
    let mut s: String;
    if lw + rw + 1 <= width {
        s = left;
        s.extend(std::iter::repeat_n(' ', width - lw - rw));
        s.push_str(&right);
    } else {
        s = left.chars().take(width).collect();
        let n = s.chars().count();
        s.extend(std::iter::repeat_n(' ', width - n));
    }
    s
}

pub fn build_status(ctx: &StatusContext<'_>, width: usize) -> String {
    format_status(&compose_status(ctx), width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> StatusContext<'static> {
        StatusContext {
            mode: Mode::Normal,
            line: 0,
            col: 4,
            file_name: None,
            dirty: false,
            branch: None,
            language: None,
            line_ending: LineEnding::Lf,
            select_mode: false,
        }
    }

    #[test]
    fn unnamed_clean_buffer() {
        let s = build_status(&ctx(), 40);
        assert_eq!(s, format!(" NORMAL  [No Name]{}Ln 1, Col 5 ", " ".repeat(10)));
        assert_eq!(s.chars().count(), 40);
    }

    #[test]
    fn named_dirty_with_branch_and_language() {
        let c = StatusContext {
            mode: Mode::Insert,
            line: 2,
            col: 10,
            file_name: Some(Path::new("/tmp/src/main.rs")),
            dirty: true,
            branch: Some("dev"),
            language: Some("rust"),
            line_ending: LineEnding::Crlf,
            select_mode: true,
        };
        let segs = compose_status(&c);
        assert_eq!(segs[1], StatusSegment::FileName(Cow::Borrowed("main.rs*")));
        let s = format_status(&segs, 60);
        assert!(s.starts_with(" INSERT  main.rs*  \u{2387} dev  SEL"), "{s}");
        assert!(s.ends_with("rust  CRLF  Ln 3, Col 11 "), "{s}");
    }

    #[test]
    fn narrow_width_drops_right_group() {
        let s = build_status(&ctx(), 12);
        assert_eq!(s, " NORMAL  [No");
    }
}
