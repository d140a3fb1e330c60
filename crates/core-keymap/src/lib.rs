//! Key names, keymaps and the prefix menu tables.
//!
//! Every key event is reduced to a stable string such as `ctrl+a`,
//! `alt+shift+up`, `space` or `J`. Keymaps map those names to action names;
//! the dispatcher owns the meaning of an action name.

use std::collections::HashMap;

use core_events::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

mod menu;

pub use menu::{MenuItem, MenuKind};

/// Normalized name for `ev`. Modifier order is `cmd`, `ctrl`, `alt`, `shift`.
///
/// Shift is folded into printable characters (`J`, `?`) unless another
/// modifier is held, in which case the base is lowercased and `shift` is
/// spelled out (`alt+shift+j`).
pub fn key_name(ev: &KeyEvent) -> String {
    let mods = ev.mods;
    let chorded = mods.intersects(KeyModifiers::CMD | KeyModifiers::CTRL | KeyModifiers::ALT);
    let mut shift = mods.contains(KeyModifiers::SHIFT);
    let base = match ev.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) if chorded && c.is_uppercase() => {
            shift = true;
            c.to_lowercase().collect()
        }
        KeyCode::Char(c) => {
            if !chorded {
                shift = false;
            }
            c.to_string()
        }
        KeyCode::BackTab => {
            shift = true;
            "tab".to_string()
        }
        other => named(other).to_string(),
    };
    let mut out = String::new();
    if mods.contains(KeyModifiers::CMD) {
        out.push_str("cmd+");
    }
    if mods.contains(KeyModifiers::CTRL) {
        out.push_str("ctrl+");
    }
    if mods.contains(KeyModifiers::ALT) {
        out.push_str("alt+");
    }
    if shift {
        out.push_str("shift+");
    }
    out.push_str(&base);
    out
}

fn named(code: KeyCode) -> &'static str {
    match code {
        KeyCode::Enter => "enter",
        KeyCode::Esc => "esc",
        KeyCode::Backspace => "backspace",
        KeyCode::Delete => "delete",
        KeyCode::Tab | KeyCode::BackTab => "tab",
        KeyCode::Up => "up",
        KeyCode::Down => "down",
        KeyCode::Left => "left",
        KeyCode::Right => "right",
        KeyCode::Home => "home",
        KeyCode::End => "end",
        KeyCode::PageUp => "pageup",
        KeyCode::PageDown => "pagedown",
        KeyCode::F(n) => match n {
            1 => "f1",
            2 => "f2",
            3 => "f3",
            4 => "f4",
            5 => "f5",
            6 => "f6",
            7 => "f7",
            8 => "f8",
            9 => "f9",
            10 => "f10",
            11 => "f11",
            12 => "f12",
            _ => "f?",
        },
        KeyCode::Char(_) => "char",
    }
}

const NORMAL_DEFAULTS: &[(&str, &str)] = &[
    ("h", "move_left"),
    ("left", "move_left"),
    ("l", "move_right"),
    ("right", "move_right"),
    ("j", "move_down"),
    ("down", "move_down"),
    ("k", "move_up"),
    ("up", "move_up"),
    ("w", "word_right"),
    ("b", "word_left"),
    ("e", "word_end"),
    ("alt+right", "word_right"),
    ("alt+left", "word_left"),
    ("home", "line_start"),
    ("end", "line_end"),
    ("cmd+left", "line_start"),
    ("cmd+right", "line_end"),
    ("cmd+up", "file_start"),
    ("cmd+down", "file_end"),
    ("pageup", "page_up"),
    ("pagedown", "page_down"),
    ("ctrl+u", "page_up"),
    ("ctrl+d", "page_down"),
    ("shift+left", "extend_left"),
    ("shift+right", "extend_right"),
    ("shift+up", "extend_up"),
    ("shift+down", "extend_down"),
    ("alt+shift+left", "extend_word_left"),
    ("alt+shift+right", "extend_word_right"),
    ("shift+home", "extend_line_start"),
    ("shift+end", "extend_line_end"),
    ("cmd+shift+left", "extend_line_start"),
    ("cmd+shift+right", "extend_line_end"),
    ("cmd+shift+up", "extend_file_start"),
    ("cmd+shift+down", "extend_file_end"),
    ("shift+pageup", "extend_page_up"),
    ("shift+pagedown", "extend_page_down"),
    ("f", "find_char"),
    ("F", "find_char_back"),
    ("t", "till_char"),
    ("T", "till_char_back"),
    ("r", "replace_char"),
    ("g", "menu_goto"),
    ("m", "menu_match"),
    ("z", "menu_view"),
    ("space", "menu_space"),
    ("i", "enter_insert"),
    ("a", "append"),
    ("I", "insert_line_start"),
    ("A", "append_line_end"),
    ("o", "open_below"),
    ("O", "open_above"),
    ("c", "change"),
    (":", "enter_command"),
    ("/", "search_forward"),
    ("?", "search_backward"),
    ("alt+/", "search_fuzzy"),
    ("alt+e", "search_regex"),
    ("n", "search_next"),
    ("N", "search_prev"),
    ("u", "undo"),
    ("U", "redo"),
    ("ctrl+r", "redo"),
    ("x", "select_line"),
    ("v", "toggle_select"),
    (";", "collapse_selection"),
    ("esc", "collapse_selection"),
    ("alt+;", "flip_selection"),
    ("alt+o", "expand_selection"),
    ("alt+i", "shrink_selection"),
    ("d", "delete"),
    ("delete", "delete"),
    ("J", "join_lines"),
    ("D", "delete_line"),
    (">", "indent"),
    ("<", "unindent"),
    ("alt+r", "restore_line"),
    ("y", "yank"),
    ("p", "paste_after"),
    ("P", "paste_before"),
    ("alt+up", "move_line_up"),
    ("alt+k", "move_line_up"),
    ("alt+down", "move_line_down"),
    ("alt+j", "move_line_down"),
];

const INSERT_DEFAULTS: &[(&str, &str)] = &[
    ("esc", "enter_normal"),
    ("enter", "insert_newline"),
    ("backspace", "delete_back"),
    ("delete", "delete_forward"),
    ("tab", "insert_indent"),
    ("alt+backspace", "delete_word_left"),
    ("ctrl+w", "delete_word_left"),
    ("left", "move_left"),
    ("right", "move_right"),
    ("up", "move_up"),
    ("down", "move_down"),
    ("alt+left", "word_left"),
    ("alt+right", "word_right"),
    ("home", "line_start"),
    ("end", "line_end"),
    ("pageup", "page_up"),
    ("pagedown", "page_down"),
    ("shift+left", "extend_left"),
    ("shift+right", "extend_right"),
    ("shift+up", "extend_up"),
    ("shift+down", "extend_down"),
    ("alt+shift+left", "extend_word_left"),
    ("alt+shift+right", "extend_word_right"),
    ("alt+up", "move_line_up"),
    ("alt+down", "move_line_down"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeymapMode {
    Normal,
    Insert,
}

/// Key name → action name tables for the two keyed modes.
#[derive(Debug, Clone)]
pub struct Keymap {
    normal: HashMap<String, String>,
    insert: HashMap<String, String>,
}

fn table(defaults: &[(&str, &str)]) -> HashMap<String, String> {
    defaults
        .iter()
        .map(|(k, a)| (k.to_string(), a.to_string()))
        .collect()
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            normal: table(NORMAL_DEFAULTS),
            insert: table(INSERT_DEFAULTS),
        }
    }
}

impl Keymap {
    /// Defaults overlaid with user bindings. An empty action name unbinds.
    pub fn with_overrides(
        normal: &HashMap<String, String>,
        insert: &HashMap<String, String>,
    ) -> Self {
        let mut km = Self::default();
        for (mode, overrides) in [(KeymapMode::Normal, normal), (KeymapMode::Insert, insert)] {
            for (key, action) in overrides {
                km.bind(mode, key, action);
            }
        }
        km
    }

    pub fn bind(&mut self, mode: KeymapMode, key: &str, action: &str) {
        let map = match mode {
            KeymapMode::Normal => &mut self.normal,
            KeymapMode::Insert => &mut self.insert,
        };
        if action.is_empty() {
            map.remove(key);
        } else {
            map.insert(key.to_string(), action.to_string());
        }
        debug!(target: "keymap", ?mode, key, action, "bind");
    }

    pub fn lookup(&self, mode: KeymapMode, key: &str) -> Option<&str> {
        let map = match mode {
            KeymapMode::Normal => &self.normal,
            KeymapMode::Insert => &self.insert,
        };
        map.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ev(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn names_follow_modifier_order() {
        assert_eq!(key_name(&KeyEvent::ctrl('a')), "ctrl+a");
        assert_eq!(
            key_name(&ev(KeyCode::Left, KeyModifiers::CMD | KeyModifiers::SHIFT)),
            "cmd+shift+left"
        );
        assert_eq!(
            key_name(&ev(KeyCode::Up, KeyModifiers::SHIFT | KeyModifiers::ALT)),
            "alt+shift+up"
        );
        assert_eq!(key_name(&KeyEvent::char(' ')), "space");
        assert_eq!(key_name(&KeyEvent::plain(KeyCode::Tab)), "tab");
        assert_eq!(key_name(&KeyEvent::plain(KeyCode::BackTab)), "shift+tab");
    }

    #[test]
    fn shift_folds_into_printables() {
        assert_eq!(key_name(&ev(KeyCode::Char('J'), KeyModifiers::SHIFT)), "J");
        assert_eq!(key_name(&ev(KeyCode::Char('?'), KeyModifiers::SHIFT)), "?");
        assert_eq!(key_name(&ev(KeyCode::Char('J'), KeyModifiers::ALT)), "alt+shift+j");
        assert_eq!(key_name(&ev(KeyCode::Char(';'), KeyModifiers::ALT)), "alt+;");
    }

    #[test]
    fn overrides_replace_and_unbind() {
        let normal = HashMap::from([
            ("ctrl+s".to_string(), "save".to_string()),
            ("x".to_string(), String::new()),
        ]);
        let km = Keymap::with_overrides(&normal, &HashMap::new());
        assert_eq!(km.lookup(KeymapMode::Normal, "ctrl+s"), Some("save"));
        assert_eq!(km.lookup(KeymapMode::Normal, "x"), None);
        assert_eq!(km.lookup(KeymapMode::Normal, "u"), Some("undo"));
        assert_eq!(km.lookup(KeymapMode::Insert, "esc"), Some("enter_normal"));
    }
}
