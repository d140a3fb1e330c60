//! Syntax highlighting: span model, the per-tick highlight cache, and the
//! parser collaborator with its tree-sitter implementation.
//!
//! Span columns are code points. Byte coordinates only cross the
//! [`SyntaxParser`] boundary inside a [`TextEdit`].

use std::collections::HashMap;
use std::path::Path;

use core_text::{Position, TextEdit};

pub mod cache;
pub mod treesitter;

pub use cache::{HighlightCache, Source};
pub use treesitter::TreeSitterService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    Keyword,
    String,
    Comment,
    Type,
    Function,
    Number,
    Constant,
    Operator,
    Punctuation,
    Field,
    Builtin,
    Variable,
    Parameter,
}

impl HighlightKind {
    /// Precedence when spans overlap; higher wins.
    pub fn priority(self) -> u8 {
        match self {
            HighlightKind::Comment => 7,
            HighlightKind::String => 6,
            HighlightKind::Keyword => 5,
            HighlightKind::Constant | HighlightKind::Builtin => 4,
            HighlightKind::Parameter
            | HighlightKind::Type
            | HighlightKind::Function
            | HighlightKind::Number => 3,
            HighlightKind::Field | HighlightKind::Variable => 2,
            HighlightKind::Operator | HighlightKind::Punctuation => 1,
        }
    }

    /// Map a highlight-query capture name (`keyword.control`, `type.builtin`…).
    pub fn from_capture_name(name: &str) -> Option<Self> {
        let mut parts = name.split('.');
        let head = parts.next()?;
        let sub = parts.next();
        Some(match (head, sub) {
            ("comment", _) => HighlightKind::Comment,
            ("string" | "escape" | "character", _) => HighlightKind::String,
            ("keyword" | "attribute" | "label", _) => HighlightKind::Keyword,
            ("type", Some("builtin")) => HighlightKind::Builtin,
            ("type" | "constructor", _) => HighlightKind::Type,
            ("function" | "method", Some("builtin")) => HighlightKind::Builtin,
            ("function" | "method", _) => HighlightKind::Function,
            ("number" | "float", _) => HighlightKind::Number,
            ("constant", Some("builtin")) => HighlightKind::Builtin,
            ("constant" | "boolean", _) => HighlightKind::Constant,
            ("operator", _) => HighlightKind::Operator,
            ("punctuation", _) => HighlightKind::Punctuation,
            ("property" | "field", _) => HighlightKind::Field,
            ("variable", Some("builtin")) => HighlightKind::Builtin,
            ("variable", Some("parameter")) => HighlightKind::Parameter,
            ("parameter", _) => HighlightKind::Parameter,
            ("variable", _) => HighlightKind::Variable,
            _ => return None,
        })
    }
}

/// Highlighted run `[start_col, end_col)` on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightSpan {
    pub start_col: usize,
    pub end_col: usize,
    pub kind: HighlightKind,
}

/// Range of one syntax node, in code-point positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRange {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Go,
}

impl Language {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "rs" => Some(Language::Rust),
            "go" => Some(Language::Go),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Go => "go",
        }
    }
}

/// Parser collaborator. Called only from the dispatcher thread; each call
/// must return promptly (an empty result is acceptable when busy).
pub trait SyntaxParser: Send + Sync {
    /// Parse `text`; incrementally when `edit` is given, fully otherwise.
    fn parse_sync(&self, path: &Path, language: Language, text: &str, edit: Option<&TextEdit>)
    -> bool;

    /// Spans for rows `[start, end)`, keyed by row.
    fn highlights(&self, path: &Path, start: usize, end: usize)
    -> HashMap<usize, Vec<HighlightSpan>>;

    /// Node ranges enclosing `pos`, innermost first.
    fn node_stack_at(&self, path: &Path, pos: Position) -> Vec<NodeRange>;

    fn start(&self) {}

    fn stop(&self) {}
}

/// Parser that accepts every document and never produces anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopParser;

impl SyntaxParser for NoopParser {
    fn parse_sync(&self, _: &Path, _: Language, _: &str, _: Option<&TextEdit>) -> bool {
        true
    }

    fn highlights(&self, _: &Path, _: usize, _: usize) -> HashMap<usize, Vec<HighlightSpan>> {
        HashMap::new()
    }

    fn node_stack_at(&self, _: &Path, _: Position) -> Vec<NodeRange> {
        Vec::new()
    }
}
