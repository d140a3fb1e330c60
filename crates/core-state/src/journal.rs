//! Changelog persistence: the undo stack as newline-delimited JSON records.
//!
//! Each record carries a kind tag `k`, the position `pr`/`pc`, the group
//! `g`, and whichever optional fields the kind needs (`r` rune, `rf`/`rt`
//! moved rows, `t` bulk text, `er`/`ec` end position, `ss`/`se`/`hs`
//! selection snapshot). Group ids are renumbered densely on load.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use core_text::{Position, Selection};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::undo::{EditAction, JournalEntry, UndoJournal};

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("changelog io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed changelog record at {path}:{line}: {message}")]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

const K_INSERT_RUNE: u8 = 0;
const K_DELETE_RUNE: u8 = 1;
const K_SPLIT_LINE: u8 = 2;
const K_JOIN_LINE: u8 = 3;
const K_MOVE_LINE: u8 = 4;
const K_INSERT_TEXT: u8 = 5;
const K_DELETE_TEXT: u8 = 6;

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
struct Record {
    k: u8,
    #[serde(default)]
    pr: usize,
    #[serde(default)]
    pc: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    r: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rf: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rt: Option<usize>,
    g: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    t: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    er: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ec: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ss: Option<[usize; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    se: Option<[usize; 2]>,
    #[serde(default, skip_serializing_if = "is_false")]
    hs: bool,
}

impl Record {
    fn at(k: u8, pos: Position, g: u64) -> Self {
        Self {
            k,
            pr: pos.row,
            pc: pos.col,
            g,
            ..Self::default()
        }
    }

    fn with_selection(mut self, selection: &Option<Selection>) -> Self {
        if let Some(sel) = selection {
            self.ss = Some([sel.anchor.row, sel.anchor.col]);
            self.se = Some([sel.head.row, sel.head.col]);
            self.hs = true;
        }
        self
    }

    fn from_entry(entry: &JournalEntry) -> Self {
        let g = entry.group;
        match &entry.action {
            EditAction::InsertRune { pos, rune } => Record {
                r: Some(*rune),
                ..Record::at(K_INSERT_RUNE, *pos, g)
            },
            EditAction::DeleteRune { pos, rune } => Record {
                r: Some(*rune),
                ..Record::at(K_DELETE_RUNE, *pos, g)
            },
            EditAction::SplitLine { pos } => Record::at(K_SPLIT_LINE, *pos, g),
            EditAction::JoinLine { pos } => Record::at(K_JOIN_LINE, *pos, g),
            EditAction::MoveLine { from, to } => Record {
                rf: Some(*from),
                rt: Some(*to),
                ..Record::at(K_MOVE_LINE, Position::default(), g)
            },
            EditAction::InsertText {
                pos,
                lines,
                selection,
            } => Record {
                t: Some(lines.clone()),
                ..Record::at(K_INSERT_TEXT, *pos, g)
            }
            .with_selection(selection),
            EditAction::DeleteText {
                pos,
                end,
                lines,
                selection,
            } => Record {
                t: Some(lines.clone()),
                er: Some(end.row),
                ec: Some(end.col),
                ..Record::at(K_DELETE_TEXT, *pos, g)
            }
            .with_selection(selection),
        }
    }

    fn selection(&self) -> Option<Selection> {
        match (self.hs, self.ss, self.se) {
            (true, Some(a), Some(h)) => Some(Selection::new(
                Position::new(a[0], a[1]),
                Position::new(h[0], h[1]),
            )),
            _ => None,
        }
    }

    fn into_entry(self) -> Result<JournalEntry, String> {
        let pos = Position::new(self.pr, self.pc);
        let selection = self.selection();
        let action = match self.k {
            K_INSERT_RUNE => EditAction::InsertRune {
                pos,
                rune: self.r.ok_or("missing rune")?,
            },
            K_DELETE_RUNE => EditAction::DeleteRune {
                pos,
                rune: self.r.ok_or("missing rune")?,
            },
            K_SPLIT_LINE => EditAction::SplitLine { pos },
            K_JOIN_LINE => EditAction::JoinLine { pos },
            K_MOVE_LINE => EditAction::MoveLine {
                from: self.rf.ok_or("missing source row")?,
                to: self.rt.ok_or("missing target row")?,
            },
            K_INSERT_TEXT => EditAction::InsertText {
                pos,
                lines: self.t.ok_or("missing text")?,
                selection,
            },
            K_DELETE_TEXT => EditAction::DeleteText {
                pos,
                end: Position::new(
                    self.er.ok_or("missing end row")?,
                    self.ec.ok_or("missing end col")?,
                ),
                lines: self.t.ok_or("missing text")?,
                selection,
            },
            k => return Err(format!("unknown kind {k}")),
        };
        Ok(JournalEntry {
            action,
            group: self.g,
        })
    }
}

/// Changelog location for a document: the absolute path with separators,
/// spaces and drive colons folded to `_`.
pub fn changelog_path(changelog_dir: &Path, document: &Path) -> PathBuf {
    let abs = std::path::absolute(document).unwrap_or_else(|_| document.to_path_buf());
    let encoded: String = abs
        .to_string_lossy()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ' ' | ':' => '_',
            c => c,
        })
        .collect();
    changelog_dir.join(format!("{encoded}.jsonl"))
}

/// Write `entries` (undo-stack order), replacing any previous log.
pub fn save(path: &Path, entries: &[JournalEntry]) -> Result<(), JournalError> {
    let io = |source| JournalError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io)?;
    }
    let mut out = Vec::new();
    for entry in entries {
        let line = serde_json::to_string(&Record::from_entry(entry)).map_err(|e| {
            JournalError::Malformed {
                path: path.to_path_buf(),
                line: 0,
                message: e.to_string(),
            }
        })?;
        out.extend_from_slice(line.as_bytes());
        out.push(b'\n');
    }
    let mut file = fs::File::create(path).map_err(io)?;
    file.write_all(&out).map_err(io)?;
    debug!(target: "state.journal", path = %path.display(), records = entries.len(), "saved");
    Ok(())
}

/// Read a changelog. A missing file is an empty journal.
pub fn load(path: &Path) -> Result<Vec<JournalEntry>, JournalError> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(JournalError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let mut entries = Vec::new();
    let mut groups: HashMap<u64, u64> = HashMap::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| JournalError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let malformed = |message: String| JournalError::Malformed {
            path: path.to_path_buf(),
            line: idx + 1,
            message,
        };
        let record: Record = serde_json::from_str(&line).map_err(|e| malformed(e.to_string()))?;
        let mut entry = record.into_entry().map_err(malformed)?;
        let next = groups.len() as u64 + 1;
        entry.group = *groups.entry(entry.group).or_insert(next);
        entries.push(entry);
    }
    debug!(target: "state.journal", path = %path.display(), records = entries.len(), "loaded");
    Ok(entries)
}

impl UndoJournal {
    pub fn persist(&self, path: &Path) -> Result<(), JournalError> {
        save(path, self.entries())
    }

    /// Journal restored from `path`, or an empty one if the log is unusable.
    pub fn restore(path: &Path) -> UndoJournal {
        match load(path) {
            Ok(entries) => UndoJournal::from_entries(entries),
            Err(e) => {
                warn!(target: "state.journal", error = %e, "discarding changelog");
                UndoJournal::new()
            }
        }
    }
}
