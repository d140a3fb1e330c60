//! The action vocabulary keymaps and menus refer to by name.

/// Cursor motions. The same set backs plain moves, selection extension and
/// helix-style selecting motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    WordRight,
    WordLeft,
    WordEnd,
    LineStart,
    LineEnd,
    FirstNonBlank,
    FileStart,
    FileEnd,
    PageUp,
    PageDown,
    WindowTop,
    WindowCenter,
    WindowBottom,
    MatchBracket,
}

impl Motion {
    /// Motions that start a selection at the pre-motion cursor in Normal mode.
    pub fn is_selecting(self) -> bool {
        matches!(self, Motion::WordRight | Motion::WordLeft | Motion::WordEnd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Motion),
    Extend(Motion),
    FindChar { forward: bool, till: bool },
    ReplaceChar,
    OpenMenu(core_keymap::MenuKind),

    EnterInsert,
    Append,
    InsertLineStart,
    AppendLineEnd,
    OpenBelow,
    OpenAbove,
    Change,
    EnterNormal,
    EnterCommand,
    SearchForward,
    SearchBackward,
    SearchFuzzy,
    SearchRegex,
    SearchNext,
    SearchPrev,
    BranchPicker,

    SelectLine,
    ToggleSelect,
    CollapseSelection,
    FlipSelection,
    ExpandSelection,
    ShrinkSelection,

    Delete,
    DeleteBack,
    DeleteWordLeft,
    InsertNewline,
    InsertIndent,
    JoinLines,
    DeleteLine,
    Indent,
    Unindent,
    RestoreLine,
    MoveLineUp,
    MoveLineDown,
    Yank,
    PasteAfter,
    PasteBefore,
    Undo,
    Redo,

    AlignTop,
    AlignCenter,
    AlignBottom,
    ScrollUp,
    ScrollDown,

    Save,
    Quit,
}

impl Action {
    pub fn from_name(name: &str) -> Option<Action> {
        use Action::*;
        use Motion as M;
        if let Some(kind) = core_keymap::MenuKind::from_action(name) {
            return Some(OpenMenu(kind));
        }
        Some(match name {
            "move_left" => Move(M::Left),
            "move_right" => Move(M::Right),
            "move_up" => Move(M::Up),
            "move_down" => Move(M::Down),
            "word_right" => Move(M::WordRight),
            "word_left" => Move(M::WordLeft),
            "word_end" => Move(M::WordEnd),
            "line_start" => Move(M::LineStart),
            "line_end" => Move(M::LineEnd),
            "first_non_blank" => Move(M::FirstNonBlank),
            "file_start" => Move(M::FileStart),
            "file_end" => Move(M::FileEnd),
            "page_up" => Move(M::PageUp),
            "page_down" => Move(M::PageDown),
            "window_top" => Move(M::WindowTop),
            "window_center" => Move(M::WindowCenter),
            "window_bottom" => Move(M::WindowBottom),
            "match_bracket" => Move(M::MatchBracket),
            "extend_left" => Extend(M::Left),
            "extend_right" => Extend(M::Right),
            "extend_up" => Extend(M::Up),
            "extend_down" => Extend(M::Down),
            "extend_word_left" => Extend(M::WordLeft),
            "extend_word_right" => Extend(M::WordRight),
            "extend_line_start" => Extend(M::LineStart),
            "extend_line_end" => Extend(M::LineEnd),
            "extend_file_start" => Extend(M::FileStart),
            "extend_file_end" => Extend(M::FileEnd),
            "extend_page_up" => Extend(M::PageUp),
            "extend_page_down" => Extend(M::PageDown),
            "find_char" => FindChar { forward: true, till: false },
            "find_char_back" => FindChar { forward: false, till: false },
            "till_char" => FindChar { forward: true, till: true },
            "till_char_back" => FindChar { forward: false, till: true },
            "replace_char" => ReplaceChar,
            "enter_insert" => EnterInsert,
            "append" => Append,
            "insert_line_start" => InsertLineStart,
            "append_line_end" => AppendLineEnd,
            "open_below" => OpenBelow,
            "open_above" => OpenAbove,
            "change" => Change,
            "enter_normal" => EnterNormal,
            "enter_command" => EnterCommand,
            "search_forward" => SearchForward,
            "search_backward" => SearchBackward,
            "search_fuzzy" => SearchFuzzy,
            "search_regex" => SearchRegex,
            "search_next" => SearchNext,
            "search_prev" => SearchPrev,
            "branch_picker" => BranchPicker,
            "select_line" => SelectLine,
            "toggle_select" => ToggleSelect,
            "collapse_selection" => CollapseSelection,
            "flip_selection" => FlipSelection,
            "expand_selection" => ExpandSelection,
            "shrink_selection" => ShrinkSelection,
            "delete" | "delete_forward" => Delete,
            "delete_back" => DeleteBack,
            "delete_word_left" => DeleteWordLeft,
            "insert_newline" => InsertNewline,
            "insert_indent" => InsertIndent,
            "join_lines" => JoinLines,
            "delete_line" => DeleteLine,
            "indent" => Indent,
            "unindent" => Unindent,
            "restore_line" => RestoreLine,
            "move_line_up" => MoveLineUp,
            "move_line_down" => MoveLineDown,
            "yank" => Yank,
            "paste_after" => PasteAfter,
            "paste_before" => PasteBefore,
            "undo" => Undo,
            "redo" => Redo,
            "align_top" => AlignTop,
            "align_center" => AlignCenter,
            "align_bottom" => AlignBottom,
            "scroll_up" => ScrollUp,
            "scroll_down" => ScrollDown,
            "save" => Save,
            "quit" => Quit,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_keymap::{Keymap, KeymapMode, MenuKind};

    #[test]
    fn every_default_binding_names_an_action() {
        let km = Keymap::default();
        for key in ["h", "w", "x", "alt+up", "space", "J", "alt+r", ">", "U"] {
            let name = km.lookup(KeymapMode::Normal, key).unwrap();
            assert!(Action::from_name(name).is_some(), "{key} -> {name}");
        }
        for key in ["esc", "enter", "tab", "ctrl+w", "backspace"] {
            let name = km.lookup(KeymapMode::Insert, key).unwrap();
            assert!(Action::from_name(name).is_some(), "{key} -> {name}");
        }
    }

    #[test]
    fn implemented_menu_items_resolve() {
        for kind in [MenuKind::Goto, MenuKind::Match, MenuKind::View, MenuKind::Space] {
            for item in kind.items().iter().filter(|i| i.implemented) {
                assert!(Action::from_name(item.action).is_some(), "{}", item.action);
            }
        }
        assert_eq!(Action::from_name("nope"), None);
    }
}
