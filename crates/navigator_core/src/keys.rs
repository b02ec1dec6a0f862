#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Escape,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    /// The event target is an input, textarea or select.
    pub in_editable: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            in_editable: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Previous,
    Next,
    ToggleShortlist,
    ClearAll,
    Escape,
}

/// Maps a key press onto a navigator command.
///
/// Arrow keys have letter equivalents (a/d/w); Ctrl+Shift+C clears the shortlist.
pub fn bind_key(press: &KeyPress) -> Option<KeyCommand> {
    match press.key {
        Key::Escape => Some(KeyCommand::Escape),
        Key::Char(c) if press.ctrl && press.shift && c.eq_ignore_ascii_case(&'c') => {
            Some(KeyCommand::ClearAll)
        }
        _ if press.ctrl => None,
        Key::ArrowLeft => Some(KeyCommand::Previous),
        Key::ArrowRight => Some(KeyCommand::Next),
        Key::ArrowUp => Some(KeyCommand::ToggleShortlist),
        Key::Char(c) => match c.to_ascii_lowercase() {
            'a' => Some(KeyCommand::Previous),
            'd' => Some(KeyCommand::Next),
            'w' => Some(KeyCommand::ToggleShortlist),
            _ => None,
        },
        Key::ArrowDown | Key::Other => None,
    }
}
