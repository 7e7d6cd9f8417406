use std::str::FromStr;

use crossterm::event::KeyCode;
use serde::{Deserialize, Serialize};

use crate::emu::Key;

/// map of characters read from the keyboard to what the chip8 might expect
/// where '1' => 0x01 and 'a' => 0x0a
const CHIP8_LITERAL_KEYMAP: [(char, Key); 16] = [
    ('0', Key::Key0),
    ('1', Key::Key1),
    ('2', Key::Key2),
    ('3', Key::Key3),
    ('4', Key::Key4),
    ('5', Key::Key5),
    ('6', Key::Key6),
    ('7', Key::Key7),
    ('8', Key::Key8),
    ('9', Key::Key9),
    ('a', Key::KeyA),
    ('b', Key::KeyB),
    ('c', Key::KeyC),
    ('d', Key::KeyD),
    ('e', Key::KeyE),
    ('f', Key::KeyF),
];

/// ditto using left-hand side of qwerty keyboard
///
/// ```text
/// 1 2 3 4        1 2 3 C
/// q w e r   =>   4 5 6 D
/// a s d f        7 8 9 E
/// z x c v        A 0 B F
/// ```
const CHIP8_CONVENTIONAL_KEYMAP: [(char, Key); 16] = [
    ('x', Key::Key0),
    ('1', Key::Key1),
    ('2', Key::Key2),
    ('3', Key::Key3),
    ('q', Key::Key4),
    ('w', Key::Key5),
    ('e', Key::Key6),
    ('a', Key::Key7),
    ('s', Key::Key8),
    ('d', Key::Key9),
    ('z', Key::KeyA),
    ('c', Key::KeyB),
    ('4', Key::KeyC),
    ('r', Key::KeyD),
    ('f', Key::KeyE),
    ('v', Key::KeyF),
];

/// Which host keys stand in for the hex keypad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLayout {
    #[default]
    Conventional,
    Literal,
}

impl KeyLayout {
    fn table(self) -> &'static [(char, Key); 16] {
        match self {
            KeyLayout::Conventional => &CHIP8_CONVENTIONAL_KEYMAP,
            KeyLayout::Literal => &CHIP8_LITERAL_KEYMAP,
        }
    }

    /// translate a host key; anything outside the layout is `None`
    pub fn map(self, host: char) -> Option<Key> {
        let host = host.to_ascii_lowercase();
        self.table()
            .iter()
            .find(|(c, _)| *c == host)
            .map(|(_, key)| *key)
    }
}

impl FromStr for KeyLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "conventional" => Ok(KeyLayout::Conventional),
            "literal" => Ok(KeyLayout::Literal),
            other => Err(format!(
                "unknown key layout {other:?}, expected conventional or literal"
            )),
        }
    }
}

/// translate a crossterm key code
pub fn map_key_code(layout: KeyLayout, code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Char(c) => layout.map(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_conventional_rows() {
        let l = KeyLayout::Conventional;
        assert_eq!(l.map('1'), Some(Key::Key1));
        assert_eq!(l.map('4'), Some(Key::KeyC));
        assert_eq!(l.map('r'), Some(Key::KeyD));
        assert_eq!(l.map('f'), Some(Key::KeyE));
        assert_eq!(l.map('x'), Some(Key::Key0));
        assert_eq!(l.map('v'), Some(Key::KeyF));
    }

    #[test]
    fn test_layouts_are_total_and_distinct() {
        for layout in [KeyLayout::Conventional, KeyLayout::Literal] {
            let keys: HashSet<Key> = layout
                .table()
                .iter()
                .map(|(c, _)| layout.map(*c).unwrap())
                .collect();
            assert_eq!(keys.len(), 16);
        }
    }

    #[test]
    fn test_unmapped_is_none() {
        assert_eq!(KeyLayout::Conventional.map('p'), None);
        assert_eq!(KeyLayout::Conventional.map('0'), None);
        assert_eq!(KeyLayout::Literal.map('g'), None);
        assert_eq!(KeyLayout::Literal.map(' '), None);
    }

    #[test]
    fn test_uppercase_maps() {
        assert_eq!(KeyLayout::Conventional.map('Q'), Some(Key::Key4));
        assert_eq!(KeyLayout::Literal.map('F'), Some(Key::KeyF));
    }

    #[test]
    fn test_key_code() {
        let l = KeyLayout::Conventional;
        assert_eq!(map_key_code(l, KeyCode::Char('w')), Some(Key::Key5));
        assert_eq!(map_key_code(l, KeyCode::Enter), None);
        assert_eq!(map_key_code(l, KeyCode::F(1)), None);
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("Literal".parse(), Ok(KeyLayout::Literal));
        assert_eq!("conventional".parse(), Ok(KeyLayout::Conventional));
        assert!("azerty".parse::<KeyLayout>().is_err());
    }
}
