/// # machine
///
/// A reference core that models the state of a COSMAC VIP running CHIP-8:
/// memory map, register file, the two 60Hz timers, the hex keypad and a
/// memory-mapped display page at 0xF00. Opcode fetch/decode/execute is the
/// business of an interpreter core and is not modelled here; `advance` only
/// drives the timers and refreshes the frame buffer from the display page.
///
/// (from: https://laurencescotford.com/chip-8-on-the-cosmac-vip-initialisation/)
/// the display page is 256 bytes, one bit per pixel, MSB leftmost, rows of
/// eight bytes
use tracing::trace;

use crate::emu::{Core, Key, KeyState, Registers, KEY_COUNT};
use crate::error::OversizedProgram;
use crate::memory::{Chip8MemoryMap, MemoryMap};

pub const FRAME_WIDTH: usize = 64;
pub const FRAME_HEIGHT: usize = 32;

/// the timers count down at 60Hz
pub const TIMER_PERIOD_MICROS: u64 = 16_667;

const PIXEL_ON: u8 = 0xff;
const PIXEL_OFF: u8 = 0x00;

pub struct Chip8Machine {
    memory: Chip8MemoryMap,
    registers: Registers,
    keypad: [KeyState; KEY_COUNT],
    frame: Vec<u8>,
    seed: u64,
    /// virtual time not yet consumed by a timer tick
    timer_debt: u64,
}

impl Chip8Machine {
    pub fn new(seed: u64) -> Self {
        let memory = Chip8MemoryMap::new();
        let registers = Self::initial_registers(&memory);
        Chip8Machine {
            memory,
            registers,
            keypad: [KeyState::Released; KEY_COUNT],
            frame: vec![PIXEL_OFF; FRAME_WIDTH * FRAME_HEIGHT],
            seed,
            timer_debt: 0,
        }
    }

    fn initial_registers(memory: &Chip8MemoryMap) -> Registers {
        Registers {
            pc: memory.program_addr,
            sp: (memory.stack_addr & 0xff) as u8,
            ..Registers::default()
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Chip8MemoryMap {
        &mut self.memory
    }

    pub fn key_state(&self, key: Key) -> KeyState {
        self.keypad[key.index()]
    }

    /// everything but the program and the seed goes back to power-on state
    fn reset_execution_state(&mut self) {
        self.memory.clear_system_area();
        self.registers = Self::initial_registers(&self.memory);
        self.keypad = [KeyState::Released; KEY_COUNT];
        self.frame.fill(PIXEL_OFF);
        self.timer_debt = 0;
    }

    fn tick_timers(&mut self, elapsed_micros: u64) {
        self.timer_debt = self.timer_debt.saturating_add(elapsed_micros);
        let ticks = self.timer_debt / TIMER_PERIOD_MICROS;
        self.timer_debt %= TIMER_PERIOD_MICROS;
        let ticks = ticks.min(u8::MAX as u64) as u8;
        self.registers.dt = self.registers.dt.saturating_sub(ticks);
        self.registers.st = self.registers.st.saturating_sub(ticks);
    }

    /// expand the bit-packed display page into one byte per pixel
    fn refresh_frame(&mut self) {
        let page = self.memory.display_page();
        for (byte_index, byte) in page.iter().enumerate() {
            for bit in 0..8 {
                let lit = (byte >> (7 - bit)) & 1 == 1;
                self.frame[byte_index * 8 + bit] = if lit { PIXEL_ON } else { PIXEL_OFF };
            }
        }
    }
}

impl Core for Chip8Machine {
    fn with_seed(seed: u64) -> Self {
        Chip8Machine::new(seed)
    }

    fn load(&mut self, program: &[u8]) -> Result<(), OversizedProgram> {
        self.memory.load_program(program)?;
        self.reset_execution_state();
        Ok(())
    }

    fn reset(&mut self) {
        self.memory.clear_program();
        self.reset_execution_state();
    }

    fn advance(&mut self, elapsed_micros: u64) {
        self.tick_timers(elapsed_micros);
        self.refresh_frame();
    }

    fn frame_buffer(&self) -> &[u8] {
        &self.frame
    }

    fn frame_width(&self) -> usize {
        FRAME_WIDTH
    }

    fn frame_height(&self) -> usize {
        FRAME_HEIGHT
    }

    fn handle_key_event(&mut self, key: Key, state: KeyState) {
        trace!(?key, ?state, "keypad");
        self.keypad[key.index()] = state;
    }

    fn registers(&self) -> Registers {
        self.registers.clone()
    }

    fn set_registers(&mut self, registers: Registers) {
        self.registers = registers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_load_ok() {
        let mut m = Chip8Machine::new(1);
        m.load(&[0x00, 0xe0]).unwrap(); // clear screen
        assert_eq!(m.memory().get_ro_slice(0x200, 2), &[0x00, 0xe0]);
        assert_eq!(m.registers().pc, 0x200);
    }

    #[test]
    fn test_oversized_load_changes_nothing() {
        let mut m = Chip8Machine::new(1);
        m.load(&[0x12, 0x00]).unwrap();
        m.set_registers(Registers {
            v: [9; 16],
            dt: 40,
            ..Registers::default()
        });
        let before = m.registers();
        let memory_before = m.memory().get_ro_slice(0, 4096).to_vec();
        assert!(m.load(&vec![0; 4000]).is_err());
        assert_eq!(m.registers(), before);
        assert_eq!(m.memory().get_ro_slice(0, 4096), memory_before.as_slice());
    }

    #[test]
    fn test_load_resets_state() {
        let mut m = Chip8Machine::new(1);
        m.set_registers(Registers {
            v: [3; 16],
            ..Registers::default()
        });
        m.handle_key_event(Key::Key5, KeyState::Pressed);
        m.load(&[0x00, 0xe0]).unwrap();
        assert_eq!(m.registers().v, [0; 16]);
        assert_eq!(m.key_state(Key::Key5), KeyState::Released);
    }

    #[test]
    fn test_timers_count_down_at_60hz() {
        let mut m = Chip8Machine::new(1);
        m.set_registers(Registers {
            dt: 10,
            st: 2,
            ..Registers::default()
        });
        m.advance(TIMER_PERIOD_MICROS * 3);
        assert_eq!(m.registers().dt, 7);
        assert_eq!(m.registers().st, 0);
    }

    #[test]
    fn test_timer_remainder_carries() {
        let mut m = Chip8Machine::new(1);
        m.set_registers(Registers {
            dt: 10,
            ..Registers::default()
        });
        m.advance(TIMER_PERIOD_MICROS / 2);
        assert_eq!(m.registers().dt, 10);
        m.advance(TIMER_PERIOD_MICROS / 2 + 1);
        assert_eq!(m.registers().dt, 9);
    }

    #[test]
    fn test_huge_advance_saturates() {
        let mut m = Chip8Machine::new(1);
        m.set_registers(Registers {
            dt: 200,
            st: 5,
            ..Registers::default()
        });
        m.advance(u64::MAX);
        m.advance(u64::MAX);
        assert_eq!(m.registers().dt, 0);
        assert_eq!(m.registers().st, 0);
    }

    #[test]
    fn test_frame_follows_display_page() {
        let mut m = Chip8Machine::new(1);
        let addr = m.memory().display_addr;
        m.memory_mut().write(&[0b1000_0001], addr);
        m.advance(0);
        let frame = m.frame_buffer();
        assert_eq!(frame.len(), FRAME_WIDTH * FRAME_HEIGHT);
        assert_eq!(frame[0], PIXEL_ON);
        assert_eq!(frame[1], PIXEL_OFF);
        assert_eq!(frame[7], PIXEL_ON);
        assert_eq!(frame[8], PIXEL_OFF);
    }

    #[test]
    fn test_reset_keeps_seed_and_clears_program() {
        let mut m = Chip8Machine::new(42);
        m.load(&[0xab, 0xcd]).unwrap();
        m.reset();
        assert_eq!(m.seed(), 42);
        assert_eq!(m.memory().get_ro_slice(0x200, 2), &[0, 0]);
        assert!(m.frame_buffer().iter().all(|p| *p == PIXEL_OFF));
    }
}
