//! Command line parsing.
//!
//! Converts the text typed after `:` into a `ParsedCommand`. The leading
//! ':' is optional so key bindings can name commands directly. Parsing is
//! pure; the dispatcher turns `Unknown` into a status message.

use std::path::PathBuf;

use core_config::LineNumbers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    /// `:w [path]`
    Write(Option<PathBuf>),
    /// `:q`
    Quit,
    /// `:q!`
    ForceQuit,
    /// `:wq [path]` / `:x [path]`
    WriteQuit(Option<PathBuf>),
    /// `:ln [off|abs|rel]`; no argument cycles.
    LineNumbers(Option<LineNumbers>),
    /// `:fmt`
    Format,
    /// Nothing typed.
    Empty,
    Unknown(String),
}

pub struct CommandParser;

impl CommandParser {
    pub fn parse(raw: &str) -> ParsedCommand {
        let s = raw.trim();
        let body = s.strip_prefix(':').unwrap_or(s).trim();
        if body.is_empty() {
            return ParsedCommand::Empty;
        }
        let (name, arg) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim()).filter(|a| !a.is_empty())),
            None => (body, None),
        };
        let path = || arg.map(PathBuf::from);
        match name {
            "w" | "write" => ParsedCommand::Write(path()),
            "q" | "quit" if arg.is_none() => ParsedCommand::Quit,
            "q!" | "quit!" if arg.is_none() => ParsedCommand::ForceQuit,
            "wq" | "x" => ParsedCommand::WriteQuit(path()),
            "ln" => match arg {
                None => ParsedCommand::LineNumbers(None),
                Some(a) => match LineNumbers::parse(a) {
                    Some(mode) => ParsedCommand::LineNumbers(Some(mode)),
                    None => ParsedCommand::Unknown(body.to_string()),
                },
            },
            "fmt" if arg.is_none() => ParsedCommand::Format,
            _ => ParsedCommand::Unknown(body.to_string()),
        }
    }
}
