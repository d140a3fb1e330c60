//! Branch picker: list local branches, check one out and reload the file.

use std::path::PathBuf;

use core_events::{KeyCode, KeyEvent, KeyModifiers};
use core_state::Mode;
use tracing::{info, warn};

use super::{DispatchResult, Dispatcher};
use crate::io_ops;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPicker {
    pub branches: Vec<String>,
    pub selected: usize,
    /// Branch checked out when the picker opened.
    pub current: Option<String>,
}

impl BranchPicker {
    pub fn selected_branch(&self) -> Option<&str> {
        self.branches.get(self.selected).map(String::as_str)
    }
}

impl Dispatcher {
    fn repo_path(&self) -> PathBuf {
        self.doc.path.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub(super) fn open_branch_picker(&mut self) {
        match self.collab.vcs.list_branches(&self.repo_path()) {
            Ok((branches, _)) if branches.is_empty() => self.status.set("no branches"),
            Ok((branches, current)) => {
                let selected = current
                    .as_ref()
                    .and_then(|c| branches.iter().position(|b| b == c))
                    .unwrap_or(0);
                self.picker = Some(BranchPicker {
                    branches,
                    selected,
                    current,
                });
                self.modes.set(Mode::BranchPicker);
            }
            Err(e) => self.status.set(e.to_string()),
        }
    }

    pub(super) fn picker_key(&mut self, key: KeyEvent) -> DispatchResult {
        let Some(picker) = self.picker.as_mut() else {
            self.modes.set(Mode::Normal);
            return DispatchResult::dirty();
        };
        match key.code {
            KeyCode::Esc => self.close_picker(),
            KeyCode::Char('c') if key.mods.contains(KeyModifiers::CTRL) => self.close_picker(),
            KeyCode::Up | KeyCode::Char('k') => {
                picker.selected = picker.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let last = picker.branches.len().saturating_sub(1);
                picker.selected = (picker.selected + 1).min(last);
            }
            KeyCode::Enter => return self.checkout_selected(),
            _ => return DispatchResult::clean(),
        }
        DispatchResult::dirty()
    }

    fn close_picker(&mut self) {
        self.picker = None;
        self.modes.set(Mode::Normal);
    }

    fn checkout_selected(&mut self) -> DispatchResult {
        let branch = self
            .picker
            .as_ref()
            .and_then(|p| p.selected_branch())
            .map(str::to_string);
        let unchanged = self.picker.as_ref().and_then(|p| p.current.clone()) == branch;
        self.close_picker();
        let Some(branch) = branch else {
            return DispatchResult::dirty();
        };
        if unchanged {
            return DispatchResult::dirty();
        }
        if let Err(e) = self.collab.vcs.checkout(&self.repo_path(), &branch) {
            self.status.set(e.to_string());
            return DispatchResult::dirty();
        }
        info!(target: "collab.git", branch = %branch, "checked out");
        self.branch = Some(branch.clone());
        if let Err(e) = self.reload() {
            warn!(target: "io", error = %e, "reload after checkout failed");
            self.status.set(format!("switched to {branch}; reload failed: {e}"));
            return DispatchResult::buffer_replaced();
        }
        self.status.set(format!("switched to {branch}"));
        DispatchResult::buffer_replaced()
    }

    /// Re-read the document from disk, dropping undo history.
    fn reload(&mut self) -> std::io::Result<()> {
        let Some(path) = self.doc.path.clone() else {
            return Ok(());
        };
        let opened = io_ops::open_file(&path)?;
        let cursor = self.buf.cursor();
        self.install(Some(path), opened, cursor);
        self.journal.clear();
        Ok(())
    }
}
