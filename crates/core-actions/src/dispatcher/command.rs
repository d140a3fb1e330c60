//! The `:` prompt: line editing, history traversal and command execution.

use std::io;
use std::path::PathBuf;

use core_events::{KeyCode, KeyEvent, KeyModifiers};
use core_state::{EditAction, Mode, changelog_path};
use core_syntax::Language;
use core_text::Position;
use tracing::{info, warn};

use super::command_parser::{CommandParser, ParsedCommand};
use super::{DispatchResult, Dispatcher};
use crate::collab::CollabError;
use crate::io_ops;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("no file name")]
    NoFileName,
    #[error("unsaved changes (use :q!)")]
    UnsavedChanges,
    #[error("write failed: {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Collab(#[from] CollabError),
}

/// What a prompt key did to the line being edited.
pub(super) enum PromptEdit {
    Submit,
    Cancel,
    Edited,
    HistoryPrev,
    HistoryNext,
    Ignored,
}

impl Dispatcher {
    /// Line editing shared by the command and search prompts.
    pub(super) fn prompt_edit(&mut self, key: KeyEvent) -> PromptEdit {
        match key.code {
            KeyCode::Enter => PromptEdit::Submit,
            KeyCode::Esc => PromptEdit::Cancel,
            KeyCode::Char('c') if key.mods.contains(KeyModifiers::CTRL) => PromptEdit::Cancel,
            KeyCode::Backspace => {
                if self.prompt.backspace() {
                    self.history_seed = None;
                    PromptEdit::Edited
                } else {
                    PromptEdit::Cancel
                }
            }
            KeyCode::Up => PromptEdit::HistoryPrev,
            KeyCode::Down => PromptEdit::HistoryNext,
            _ => match key.printable() {
                Some(c) => {
                    self.prompt.push_char(c);
                    self.history_seed = None;
                    PromptEdit::Edited
                }
                None => PromptEdit::Ignored,
            },
        }
    }

    pub(super) fn begin_command(&mut self) {
        self.buf.clear_selection();
        self.modes.select_mode = false;
        self.prompt.begin(':');
        self.history_seed = None;
        self.command_history.reset_cursor();
        self.modes.set(Mode::Command);
    }

    fn close_prompt(&mut self) {
        self.prompt.clear();
        self.history_seed = None;
        self.modes.set(Mode::Normal);
    }

    pub(super) fn command_key(&mut self, key: KeyEvent) -> DispatchResult {
        match self.prompt_edit(key) {
            PromptEdit::Submit => {
                let raw = self.prompt.text().to_string();
                self.close_prompt();
                self.command_history.push(raw.trim());
                self.execute_command(&raw)
            }
            PromptEdit::Cancel => {
                self.close_prompt();
                DispatchResult::dirty()
            }
            PromptEdit::HistoryPrev => {
                self.command_history_step(true);
                DispatchResult::dirty()
            }
            PromptEdit::HistoryNext => {
                self.command_history_step(false);
                DispatchResult::dirty()
            }
            PromptEdit::Edited => DispatchResult::dirty(),
            PromptEdit::Ignored => DispatchResult::clean(),
        }
    }

    /// Walk command history filtered by what was typed before the walk
    /// began. Walking past the newest entry restores the typed text.
    fn command_history_step(&mut self, older: bool) {
        let seed = self
            .history_seed
            .get_or_insert_with(|| self.prompt.text().to_string())
            .clone();
        let entry = if older {
            self.command_history.prev(&seed).map(str::to_string)
        } else {
            self.command_history.next(&seed).map(str::to_string)
        };
        match entry {
            Some(e) => self.prompt.set_text(&e),
            None if !older => self.prompt.set_text(&seed),
            None => {}
        }
    }

    /// Run a command line; failures land in the status line.
    pub(super) fn execute_command(&mut self, raw: &str) -> DispatchResult {
        let parsed = CommandParser::parse(raw);
        info!(target: "actions.command", command = raw.trim(), ?parsed, "execute");
        match self.run_command(parsed) {
            Ok(result) => result,
            Err(e) => {
                warn!(target: "actions.command", error = %e, "command failed");
                self.status.set(e.to_string());
                DispatchResult::dirty()
            }
        }
    }

    fn run_command(&mut self, cmd: ParsedCommand) -> Result<DispatchResult, CommandError> {
        match cmd {
            ParsedCommand::Empty => Ok(DispatchResult::dirty()),
            ParsedCommand::Write(path) => {
                self.write(path)?;
                Ok(DispatchResult::dirty())
            }
            ParsedCommand::WriteQuit(path) => {
                self.write(path)?;
                Ok(DispatchResult::quit())
            }
            ParsedCommand::Quit => {
                if self.journal.is_dirty() {
                    return Err(CommandError::UnsavedChanges);
                }
                Ok(DispatchResult::quit())
            }
            ParsedCommand::ForceQuit => Ok(DispatchResult::quit()),
            ParsedCommand::LineNumbers(mode) => {
                let next = mode.unwrap_or_else(|| self.opts.line_numbers.cycle());
                self.opts.line_numbers = next;
                self.status.set(format!("line numbers: {}", next.as_str()));
                Ok(DispatchResult::dirty())
            }
            ParsedCommand::Format => {
                self.format()?;
                Ok(DispatchResult::dirty())
            }
            ParsedCommand::Unknown(s) => Err(CommandError::Unknown(s)),
        }
    }

    /// Write the document, optionally under a new name, and persist its
    /// changelog.
    fn write(&mut self, target: Option<PathBuf>) -> Result<(), CommandError> {
        let path = target
            .or_else(|| self.doc.path.clone())
            .ok_or(CommandError::NoFileName)?;
        let text = self.buf.to_text();
        let ending = self.doc.line_ending;
        let bytes = io_ops::write_file(&path, &text, ending, self.doc.trailing_newline)
            .map_err(|source| CommandError::Write {
                path: path.display().to_string(),
                source,
            })?;
        if self.doc.path.as_ref() != Some(&path) {
            self.doc.language = Language::from_path(&path);
            self.doc.path = Some(path.clone());
            self.highlights.reset(self.buf.len_bytes());
            self.buf.invalidate_edit();
            self.journal.note_change();
            self.collab.lsp.open_file(&path, &text);
        }
        self.journal.mark_saved();
        if let Some(dir) = self.opts.paths.changelog_dir()
            && let Err(e) = self.journal.persist(&changelog_path(&dir, &path))
        {
            warn!(target: "state.journal", error = %e, "changelog not saved");
        }
        self.doc.saved_lines = (0..self.buf.line_count())
            .map(|r| self.buf.line_string(r))
            .collect();
        self.status.set(format!(
            "\"{}\" {}L, {}B written",
            path.display(),
            self.buf.line_count(),
            bytes
        ));
        Ok(())
    }

    /// `:fmt`: replace the document with the formatter's output as one
    /// undoable step.
    fn format(&mut self) -> Result<(), CommandError> {
        let text = self.buf.to_text();
        let formatted = self.collab.formatter.format(self.doc.language, &text)?;
        let formatted = formatted.strip_suffix('\n').unwrap_or(&formatted);
        if formatted == text {
            self.status.set("already formatted");
            return Ok(());
        }
        let cursor = self.buf.cursor();
        let end = self.buf.last_position();
        let new_lines: Vec<String> = formatted.split('\n').map(str::to_string).collect();
        self.buf.clear_selection();
        let ok = self.grouped(|d| {
            let removed = d.buf.text_in_range(Position::new(0, 0), end);
            (end == Position::new(0, 0)
                || d.apply(EditAction::DeleteText {
                    pos: Position::new(0, 0),
                    end,
                    lines: removed,
                    selection: None,
                }))
                && (formatted.is_empty()
                    || d.apply(EditAction::InsertText {
                        pos: Position::new(0, 0),
                        lines: new_lines,
                        selection: None,
                    }))
        });
        if ok {
            self.buf.set_cursor(cursor);
            self.status.set("formatted");
        } else {
            self.status.set("format failed: could not apply");
        }
        Ok(())
    }
}
