//! Terminal input: translation of crossterm events into editor events and
//! the async task that forwards them to the runtime channel.

mod source;

pub use source::CrosstermInputSource;

use core_events::{InputEvent, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crossterm::event::{
    Event as CEvent, KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind,
    KeyModifiers as CMods, MouseButton, MouseEvent as CMouseEvent, MouseEventKind as CMouseKind,
};

/// Map one crossterm event. Key releases, unsupported keys, mouse motion,
/// focus changes and bracketed paste produce `None`.
pub fn map_event(ev: CEvent) -> Option<InputEvent> {
    match ev {
        CEvent::Key(key) => map_key(key).map(InputEvent::Key),
        CEvent::Mouse(m) => map_mouse(m).map(InputEvent::Mouse),
        CEvent::Resize(w, h) => Some(InputEvent::Resize(w, h)),
        CEvent::Paste(_) | CEvent::FocusGained | CEvent::FocusLost => None,
    }
}

pub fn map_key(key: CKeyEvent) -> Option<KeyEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let code = match key.code {
        CKeyCode::Char(c) => KeyCode::Char(c),
        CKeyCode::Enter => KeyCode::Enter,
        CKeyCode::Esc => KeyCode::Esc,
        CKeyCode::Backspace => KeyCode::Backspace,
        CKeyCode::Delete => KeyCode::Delete,
        CKeyCode::Tab => KeyCode::Tab,
        CKeyCode::BackTab => KeyCode::BackTab,
        CKeyCode::Up => KeyCode::Up,
        CKeyCode::Down => KeyCode::Down,
        CKeyCode::Left => KeyCode::Left,
        CKeyCode::Right => KeyCode::Right,
        CKeyCode::Home => KeyCode::Home,
        CKeyCode::End => KeyCode::End,
        CKeyCode::PageUp => KeyCode::PageUp,
        CKeyCode::PageDown => KeyCode::PageDown,
        CKeyCode::F(n) => KeyCode::F(n),
        _ => return None,
    };
    Some(KeyEvent::new(code, map_mods(key.modifiers)))
}

fn map_mouse(m: CMouseEvent) -> Option<MouseEvent> {
    let kind = match m.kind {
        CMouseKind::Down(MouseButton::Left) => MouseEventKind::LeftDown,
        CMouseKind::ScrollUp => MouseEventKind::ScrollUp,
        CMouseKind::ScrollDown => MouseEventKind::ScrollDown,
        _ => return None,
    };
    Some(MouseEvent {
        kind,
        column: m.column,
        row: m.row,
        mods: map_mods(m.modifiers),
    })
}

pub(crate) fn map_mods(m: CMods) -> KeyModifiers {
    let mut out = KeyModifiers::empty();
    if m.contains(CMods::CONTROL) {
        out |= KeyModifiers::CTRL;
    }
    if m.contains(CMods::ALT) {
        out |= KeyModifiers::ALT;
    }
    if m.contains(CMods::SHIFT) {
        out |= KeyModifiers::SHIFT;
    }
    if m.intersects(CMods::SUPER | CMods::META) {
        out |= KeyModifiers::CMD;
    }
    out
}
