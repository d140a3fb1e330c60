//! Editor state pieces owned by the dispatcher: the undo journal and its
//! changelog, mode, status and prompt lines, histories, the viewport, and
//! line-ending normalization for file IO.

pub mod history;
pub mod journal;
pub mod undo;
pub mod view;

pub use history::{HISTORY_MAX, History};
pub use journal::{JournalError, changelog_path};
pub use undo::{EditAction, JournalEntry, StepError, UndoJournal, text_end};
pub use view::{Align, View};

/// Current editor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
    Command,
    Search,
    BranchPicker,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Command => "COMMAND",
            Mode::Search => "SEARCH",
            Mode::BranchPicker => "BRANCH",
        }
    }
}

/// One-line transient message. Cleared by the next key press outside the
/// Command and Search modes.
#[derive(Debug, Default, Clone)]
pub struct StatusLine {
    message: Option<String>,
}

impl StatusLine {
    pub fn set<S: Into<String>>(&mut self, msg: S) {
        self.message = Some(msg.into());
    }

    pub fn clear(&mut self) {
        self.message = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Text being typed after a prompt character (`:`, `/`, `?`).
#[derive(Debug, Default, Clone)]
pub struct PromptLine {
    prompt: Option<char>,
    text: String,
}

impl PromptLine {
    pub fn is_active(&self) -> bool {
        self.prompt.is_some()
    }

    pub fn prompt(&self) -> Option<char> {
        self.prompt
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Start a fresh prompt.
    pub fn begin(&mut self, prompt: char) {
        self.prompt = Some(prompt);
        self.text.clear();
    }

    pub fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
    }

    pub fn push_char(&mut self, ch: char) {
        self.text.push(ch);
    }

    /// Remove the last char. Returns false when the text was already empty.
    pub fn backspace(&mut self) -> bool {
        self.text.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.prompt = None;
        self.text.clear();
    }
}

/// Line ending style of a file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    Cr,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// File text converted to LF-only form plus what is needed to write it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    /// LF-only content without the final newline.
    pub text: String,
    /// Majority style; ties prefer CRLF, then LF, then CR.
    pub ending: LineEnding,
    pub had_trailing_newline: bool,
    pub mixed: bool,
}

/// Normalize CRLF and lone CR to LF and strip one trailing newline.
pub fn normalize_line_endings(input: &str) -> NormalizedText {
    let (mut crlf, mut lf, mut cr) = (0usize, 0usize, 0usize);
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                crlf += 1;
                out.push('\n');
            }
            '\r' => {
                cr += 1;
                out.push('\n');
            }
            '\n' => {
                lf += 1;
                out.push('\n');
            }
            c => out.push(c),
        }
    }
    let mut ending = LineEnding::Lf;
    let mut max = 0;
    for (style, count) in [
        (LineEnding::Crlf, crlf),
        (LineEnding::Lf, lf),
        (LineEnding::Cr, cr),
    ] {
        if count > max {
            max = count;
            ending = style;
        }
    }
    let mixed = [crlf, lf, cr].iter().filter(|c| **c > 0).count() > 1;
    let had_trailing_newline = out.ends_with('\n');
    if had_trailing_newline {
        out.pop();
    }
    NormalizedText {
        text: out,
        ending,
        had_trailing_newline,
        mixed,
    }
}

/// Inverse of [`normalize_line_endings`] for writing.
pub fn denormalize(text: &str, ending: LineEnding, trailing_newline: bool) -> String {
    let mut out = match ending {
        LineEnding::Lf => text.to_string(),
        other => text.replace('\n', other.as_str()),
    };
    if trailing_newline {
        out.push_str(ending.as_str());
    }
    out
}
