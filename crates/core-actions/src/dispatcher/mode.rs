//! Mode state, keys that wait for a follow-up key, and prefix menus.

use core_events::{KeyCode, KeyEvent};
use core_keymap::MenuKind;
use core_state::Mode;
use core_text::motion;
use tracing::{debug, trace};

use super::{DispatchResult, Dispatcher};
use crate::Action;

/// A Normal-mode prefix waiting for its next key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pending {
    #[default]
    None,
    FindChar {
        forward: bool,
        till: bool,
    },
    ReplaceChar,
    Menu(MenuKind),
}

#[derive(Debug, Default)]
pub(crate) struct ModeMachine {
    pub mode: Mode,
    pub pending: Pending,
    /// Latch that turns every motion into a selection extension.
    pub select_mode: bool,
}

impl ModeMachine {
    pub fn set(&mut self, mode: Mode) {
        if self.mode != mode {
            trace!(target: "actions.dispatch", from = self.mode.label(), to = mode.label(), "mode");
        }
        self.mode = mode;
        self.pending = Pending::None;
    }
}

impl Dispatcher {
    pub(super) fn resolve_pending(&mut self, pending: Pending, key: KeyEvent) -> DispatchResult {
        if key.code == KeyCode::Esc {
            return DispatchResult::dirty();
        }
        match pending {
            Pending::None => DispatchResult::clean(),
            Pending::FindChar { forward, till } => {
                let Some(target) = key.printable() else {
                    return DispatchResult::dirty();
                };
                let from = self.buf.cursor();
                if let Some(to) = motion::find_char(&self.buf, from, target, forward, till) {
                    self.select_to(from, to);
                }
                DispatchResult::dirty()
            }
            Pending::ReplaceChar => {
                if let Some(c) = key.printable() {
                    self.replace_char(c);
                }
                DispatchResult::dirty()
            }
            Pending::Menu(kind) => self.menu_key(kind, key),
        }
    }

    pub(super) fn open_menu(&mut self, kind: MenuKind) {
        trace!(target: "actions.dispatch", menu = kind.title(), "menu open");
        self.modes.pending = Pending::Menu(kind);
    }

    fn menu_key(&mut self, kind: MenuKind, key: KeyEvent) -> DispatchResult {
        let name = core_keymap::key_name(&key);
        let Some(item) = kind.lookup(&name) else {
            return DispatchResult::dirty();
        };
        if !item.implemented {
            self.status.set(format!("{}: not implemented", item.label));
            return DispatchResult::dirty();
        }
        match Action::from_name(item.action) {
            Some(action) => self.run(action),
            None => {
                debug!(target: "actions.dispatch", menu = kind.title(), action = item.action, "menu item names no action");
                DispatchResult::dirty()
            }
        }
    }

    pub(super) fn enter_insert(&mut self, how: Action) {
        let cur = self.buf.cursor();
        let pos = match how {
            Action::Append => motion::right(&self.buf, cur),
            Action::InsertLineStart => motion::first_non_blank(&self.buf, cur),
            Action::AppendLineEnd => motion::line_end(&self.buf, cur),
            _ => cur,
        };
        self.buf.clear_selection();
        self.modes.select_mode = false;
        self.buf.set_cursor(pos);
        self.modes.set(Mode::Insert);
    }

    pub(super) fn enter_normal(&mut self) {
        self.modes.select_mode = false;
        self.modes.set(Mode::Normal);
    }
}
