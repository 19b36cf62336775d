/// Ctrl-Q, as delivered by a terminal in raw mode (DC1)
pub const QUIT_CHAR: char = '\u{11}';

/// Host keys laid out like the COSMAC VIP 4x4 hex keypad:
///
/// ```text
/// 1 2 3 4      1 2 3 C
/// q w e r  =>  4 5 6 D
/// a s d f      7 8 9 E
/// z x c v      A 0 B F
/// ```
const CHIP8_LAYOUT: [(char, usize); 16] = [
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('4', 0x0C),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('r', 0x0D),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('f', 0x0E),
    ('z', 0x0A),
    ('x', 0x00),
    ('c', 0x0B),
    ('v', 0x0F),
];

/// Different key bindings
pub enum Keymap {
    Chip8,
}

/// Actions to be executed by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    EmulateKeyState(usize, bool),
    Quit,
}

/// A host key, already stripped of frontend specifics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKey {
    Char(char),
    Escape,
}

impl Keymap {
    /// Keypad index for a host key, if it has one
    pub fn keypad_index(&self, key: HostKey) -> Option<usize> {
        match (self, key) {
            (Keymap::Chip8, HostKey::Char(c)) => {
                let c = c.to_ascii_lowercase();
                CHIP8_LAYOUT
                    .iter()
                    .find(|(host, _)| *host == c)
                    .map(|(_, index)| *index)
            }
            (Keymap::Chip8, HostKey::Escape) => None,
        }
    }

    /// Translate a host key into an action to be executed by the app
    pub fn translate_action(&self, key: HostKey, pressed: bool) -> Option<Action> {
        match key {
            HostKey::Escape | HostKey::Char(QUIT_CHAR) => {
                if pressed {
                    Some(Action::Quit)
                } else {
                    None
                }
            }
            _ => self
                .keypad_index(key)
                .map(|index| Action::EmulateKeyState(index, pressed)),
        }
    }
}
