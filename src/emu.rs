/// # emu
///
/// The contract between the driver and an emulation core. The driver never
/// looks inside the core: it hands over program images, feeds virtual time in
/// microseconds, forwards key events and reads back a frame buffer with one
/// intensity byte per pixel.
use serde::{Deserialize, Serialize};

use crate::error::OversizedProgram;

/// number of keys on the hex keypad
pub const KEY_COUNT: usize = 16;

/// An emulation core. Implementations own CPU, memory and timer state; the
/// driver serialises every `&mut self` call against `advance`.
pub trait Core: Send {
    /// construct a core; the seed feeds the core's random number generator
    fn with_seed(seed: u64) -> Self
    where
        Self: Sized;

    /// replace program memory and execution state with a fresh image. Must
    /// not modify anything when returning `Err`.
    fn load(&mut self, program: &[u8]) -> Result<(), OversizedProgram>;

    /// clear execution state and program memory; the seed is kept
    fn reset(&mut self);

    /// move the core forward by the given amount of virtual time
    fn advance(&mut self, elapsed_micros: u64);

    /// the current frame, `frame_width() * frame_height()` bytes
    fn frame_buffer(&self) -> &[u8];

    fn frame_width(&self) -> usize;

    fn frame_height(&self) -> usize;

    /// queue a key event; the core applies it at its next step boundary
    fn handle_key_event(&mut self, key: Key, state: KeyState);

    fn registers(&self) -> Registers;

    /// replace the live register file wholesale
    fn set_registers(&mut self, registers: Registers);
}

/// The 16 keys of the COSMAC VIP hex keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
}

impl Key {
    pub const ALL: [Key; KEY_COUNT] = [
        Key::Key0,
        Key::Key1,
        Key::Key2,
        Key::Key3,
        Key::Key4,
        Key::Key5,
        Key::Key6,
        Key::Key7,
        Key::Key8,
        Key::Key9,
        Key::KeyA,
        Key::KeyB,
        Key::KeyC,
        Key::KeyD,
        Key::KeyE,
        Key::KeyF,
    ];

    /// the key's hex value, also its index into keypad state
    pub fn index(self) -> usize {
        u8::from(self) as usize
    }
}

impl From<Key> for u8 {
    fn from(key: Key) -> Self {
        key as u8
    }
}

impl TryFrom<u8> for Key {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Key::ALL.get(value as usize).copied().ok_or(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// A copy of the core's register file. Deserialising a partial snapshot
/// zeroes every omitted field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registers {
    /// instruction pointer
    pub pc: u16,
    /// stack pointer
    pub sp: u8,
    /// delay timer
    pub dt: u8,
    /// sound timer
    pub st: u8,
    /// general-purpose registers V0-VF
    pub v: [u8; 16],
    /// index register
    pub i: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_values_round_trip() {
        for (i, key) in Key::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
            assert_eq!(Key::try_from(i as u8), Ok(*key));
        }
    }

    #[test]
    fn test_key_out_of_range() {
        assert_eq!(Key::try_from(0x10), Err(0x10));
        assert_eq!(Key::try_from(0xff), Err(0xff));
    }

    #[test]
    fn test_partial_snapshot_zeroes_omitted_fields() {
        let r: Registers = toml::from_str("pc = 0x300\ndt = 7").unwrap();
        assert_eq!(
            r,
            Registers {
                pc: 0x300,
                dt: 7,
                ..Registers::default()
            }
        );
        assert_eq!(r.v, [0; 16]);
    }

    #[test]
    fn test_full_snapshot() {
        let r: Registers = toml::from_str(
            "pc = 512\nsp = 1\ndt = 2\nst = 3\ni = 4\nv = [1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,16]",
        )
        .unwrap();
        assert_eq!(r.v[15], 16);
        assert_eq!(r.i, 4);
        assert_eq!(r.sp, 1);
    }
}
