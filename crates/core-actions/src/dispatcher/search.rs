//! Search prompts (`/`, `?`, fuzzy, regex) and `n` / `N` navigation.
//!
//! The match list is recomputed on every keystroke from the row the search
//! started on. A regex that does not compile leaves the list empty and puts
//! the error in the status line; confirming it returns to Normal without
//! touching history.

use core_events::KeyEvent;
use core_search::SearchKind;
use core_state::Mode;
use core_text::Position;
use tracing::debug;

use super::command::PromptEdit;
use super::{DispatchResult, Dispatcher};

impl Dispatcher {
    pub(super) fn begin_search(&mut self, kind: SearchKind, backward: bool) {
        self.search_kind = kind;
        self.search_backward = backward;
        self.search_origin = self.buf.cursor();
        self.prompt.begin(if backward { '?' } else { '/' });
        self.history_seed = None;
        self.search_history.reset_cursor();
        self.modes.select_mode = false;
        self.modes.set(Mode::Search);
    }

    pub(super) fn search_key(&mut self, key: KeyEvent) -> DispatchResult {
        match self.prompt_edit(key) {
            PromptEdit::Submit => self.confirm_search(),
            PromptEdit::Cancel => {
                self.prompt.clear();
                self.history_seed = None;
                self.search.clear();
                self.status.clear();
                self.buf.set_cursor(self.search_origin);
                self.modes.set(Mode::Normal);
            }
            PromptEdit::Edited => self.live_search(),
            PromptEdit::HistoryPrev => self.search_history_step(true),
            PromptEdit::HistoryNext => self.search_history_step(false),
            PromptEdit::Ignored => return DispatchResult::clean(),
        }
        DispatchResult::dirty()
    }

    fn search_history_step(&mut self, older: bool) {
        let seed = self
            .history_seed
            .get_or_insert_with(|| self.prompt.text().to_string())
            .clone();
        let entry = if older {
            self.search_history.prev(self.search_kind, &seed)
        } else {
            self.search_history.next(self.search_kind, &seed)
        };
        match entry {
            Some(e) => self.prompt.set_text(&e),
            None if !older => self.prompt.set_text(&seed),
            None => return,
        }
        self.live_search();
    }

    /// Recompute matches for the typed query.
    fn live_search(&mut self) {
        let query = self.prompt.text().to_string();
        let origin = self.search_origin.row;
        match self.search.set_query(&self.buf, &query, self.search_kind, origin) {
            Ok(_) => {
                if self.search_backward {
                    self.search.seek(origin, false);
                }
                self.status.clear();
            }
            Err(e) => self.status.set(e.to_string()),
        }
    }

    fn confirm_search(&mut self) {
        let query = self.prompt.text().to_string();
        self.prompt.clear();
        self.history_seed = None;
        self.modes.set(Mode::Normal);
        if query.is_empty() {
            self.search.clear();
            return;
        }
        let origin = self.search_origin.row;
        let found = match self.search.set_query(&self.buf, &query, self.search_kind, origin) {
            Ok(n) => n,
            Err(e) => {
                debug!(target: "search", error = %e, "query rejected");
                self.status.set(e.to_string());
                return;
            }
        };
        self.search_history.push(self.search_kind, &query);
        if found == 0 {
            self.status.set("no matches");
            return;
        }
        if self.search_backward {
            self.search.seek(origin, false);
        }
        self.jump_to_current();
    }

    fn jump_to_current(&mut self) {
        if let Some(m) = self.search.current() {
            let pos = Position::new(m.row, m.col);
            self.buf.clear_selection();
            self.buf.set_cursor(pos);
        }
        self.status.set(self.search.status());
    }

    /// `n` (`forward`) / `N`, relative to the direction the search was
    /// started in.
    pub(super) fn search_step(&mut self, forward: bool) {
        if self.search.query().is_empty() {
            self.status.set("no search");
            return;
        }
        if self.search.matches().is_empty() {
            let _ = self.search.recompute(&self.buf);
        }
        let forward = forward != self.search_backward;
        let wrapped = match self.search.step(forward) {
            Some((_, wrapped)) => wrapped,
            None => {
                self.status.set("no matches");
                return;
            }
        };
        self.jump_to_current();
        if wrapped {
            let msg = format!("{} (wrapped)", self.search.status());
            self.status.set(msg);
        }
    }
}
