//! Prefix menus opened by `g`, `m`, `z`, `space` and `space w`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuKind {
    Goto,
    Match,
    View,
    Space,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub key: &'static str,
    pub label: &'static str,
    pub action: &'static str,
    pub implemented: bool,
}

const fn item(key: &'static str, label: &'static str, action: &'static str) -> MenuItem {
    MenuItem {
        key,
        label,
        action,
        implemented: true,
    }
}

const fn planned(key: &'static str, label: &'static str, action: &'static str) -> MenuItem {
    MenuItem {
        key,
        label,
        action,
        implemented: false,
    }
}

const GOTO: &[MenuItem] = &[
    item("g", "file start", "file_start"),
    item("e", "file end", "file_end"),
    item("h", "line start", "line_start"),
    item("l", "line end", "line_end"),
    item("s", "first non-blank", "first_non_blank"),
    item("t", "window top", "window_top"),
    item("c", "window center", "window_center"),
    item("b", "window bottom", "window_bottom"),
    planned("d", "definition", "goto_definition"),
    planned("r", "references", "goto_references"),
];

const MATCH: &[MenuItem] = &[
    item("m", "matching bracket", "match_bracket"),
    planned("s", "surround add", "surround_add"),
    planned("r", "surround replace", "surround_replace"),
    planned("d", "surround delete", "surround_delete"),
    planned("i", "select inside", "select_inside"),
    planned("a", "select around", "select_around"),
];

const VIEW: &[MenuItem] = &[
    item("z", "align center", "align_center"),
    item("c", "align center", "align_center"),
    item("t", "align top", "align_top"),
    item("b", "align bottom", "align_bottom"),
    item("j", "scroll down", "scroll_down"),
    item("k", "scroll up", "scroll_up"),
];

const SPACE: &[MenuItem] = &[
    item("b", "branches", "branch_picker"),
    item("y", "yank to clipboard", "yank"),
    item("p", "paste after", "paste_after"),
    item("P", "paste before", "paste_before"),
    item("/", "fuzzy search", "search_fuzzy"),
    item("w", "window", "menu_window"),
    planned("f", "file picker", "file_picker"),
    planned("s", "symbol picker", "symbol_picker"),
];

const WINDOW: &[MenuItem] = &[
    planned("v", "vertical split", "split_vertical"),
    planned("s", "horizontal split", "split_horizontal"),
    planned("w", "next window", "window_next"),
    planned("q", "close window", "window_close"),
    planned("o", "only window", "window_only"),
];

impl MenuKind {
    pub fn title(self) -> &'static str {
        match self {
            MenuKind::Goto => "Goto",
            MenuKind::Match => "Match",
            MenuKind::View => "View",
            MenuKind::Space => "Space",
            MenuKind::Window => "Window",
        }
    }

    pub fn items(self) -> &'static [MenuItem] {
        match self {
            MenuKind::Goto => GOTO,
            MenuKind::Match => MATCH,
            MenuKind::View => VIEW,
            MenuKind::Space => SPACE,
            MenuKind::Window => WINDOW,
        }
    }

    pub fn lookup(self, key: &str) -> Option<&'static MenuItem> {
        self.items().iter().find(|i| i.key == key)
    }

    /// Menu opened by a `menu_*` action name.
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "menu_goto" => Some(MenuKind::Goto),
            "menu_match" => Some(MenuKind::Match),
            "menu_view" => Some(MenuKind::View),
            "menu_space" => Some(MenuKind::Space),
            "menu_window" => Some(MenuKind::Window),
            _ => None,
        }
    }
}
