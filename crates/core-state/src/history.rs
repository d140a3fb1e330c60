//! Line history with prefix-filtered traversal (command line, search prompt).
//!
//! Persisted as a newline-delimited file holding the most recent
//! [`HISTORY_MAX`] entries, oldest first.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub const HISTORY_MAX: usize = 1000;

#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<String>,
    /// Traversal index; `None` means "past the newest entry".
    cursor: Option<usize>,
    path: Option<PathBuf>,
}

impl History {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path`. Unreadable files start an empty history bound to the
    /// same path.
    pub fn load(path: &Path) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(text) => {
                let mut v: Vec<String> = text
                    .lines()
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect();
                let excess = v.len().saturating_sub(HISTORY_MAX);
                v.drain(..excess);
                v
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(target: "state.history", path = %path.display(), error = %e, "history unreadable");
                Vec::new()
            }
        };
        Self {
            entries,
            cursor: None,
            path: Some(path.to_path_buf()),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Append an entry (consecutive duplicates collapse) and write through.
    pub fn push(&mut self, entry: &str) {
        self.cursor = None;
        if entry.is_empty() || self.entries.last().is_some_and(|l| l == entry) {
            return;
        }
        self.entries.push(entry.to_string());
        if self.entries.len() > HISTORY_MAX {
            let excess = self.entries.len() - HISTORY_MAX;
            self.entries.drain(..excess);
        }
        self.flush();
    }

    fn flush(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(dir) = path.parent()
            && let Err(e) = fs::create_dir_all(dir)
        {
            warn!(target: "state.history", error = %e, "cannot create history dir");
            return;
        }
        let mut text = self.entries.join("\n");
        text.push('\n');
        match fs::write(path, text) {
            Ok(()) => debug!(target: "state.history", path = %path.display(), entries = self.entries.len(), "flushed"),
            Err(e) => warn!(target: "state.history", path = %path.display(), error = %e, "history write failed"),
        }
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    /// Step to the next older entry starting with `prefix`.
    pub fn prev(&mut self, prefix: &str) -> Option<&str> {
        let upto = self.cursor.unwrap_or(self.entries.len());
        let idx = self.entries[..upto]
            .iter()
            .rposition(|e| e.starts_with(prefix))?;
        self.cursor = Some(idx);
        Some(&self.entries[idx])
    }

    /// Step to the next newer entry starting with `prefix`. Walking off the
    /// newest end resets traversal and returns `None`.
    pub fn next(&mut self, prefix: &str) -> Option<&str> {
        let from = self.cursor? + 1;
        match self.entries[from..].iter().position(|e| e.starts_with(prefix)) {
            Some(i) => {
                self.cursor = Some(from + i);
                Some(&self.entries[from + i])
            }
            None => {
                self.cursor = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_filtered_traversal() {
        let mut h = History::in_memory();
        for e in ["w", "wq", "ln rel", "w out.txt"] {
            h.push(e);
        }
        assert_eq!(h.prev("w"), Some("w out.txt"));
        assert_eq!(h.prev("w"), Some("wq"));
        assert_eq!(h.prev("w"), Some("w"));
        assert_eq!(h.prev("w"), None);
        assert_eq!(h.next("w"), Some("wq"));
        assert_eq!(h.next("w"), Some("w out.txt"));
        assert_eq!(h.next("w"), None);
        assert_eq!(h.prev(""), Some("w out.txt"));
    }

    #[test]
    fn duplicates_collapse_and_cap_holds() {
        let mut h = History::in_memory();
        h.push("q");
        h.push("q");
        assert_eq!(h.entries().len(), 1);
        for i in 0..HISTORY_MAX + 5 {
            h.push(&format!("cmd{i}"));
        }
        assert_eq!(h.entries().len(), HISTORY_MAX);
        assert_eq!(h.entries()[0], "cmd5");
    }

    #[test]
    fn writes_through_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("command_history");
        let mut h = History::load(&path);
        h.push("w");
        h.push("ln abs");
        let again = History::load(&path);
        assert_eq!(again.entries(), &["w".to_string(), "ln abs".to_string()]);
    }
}
