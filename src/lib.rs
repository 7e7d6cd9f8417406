//! A host for CHIP-8 style emulation cores.
//!
//! ## Design
//!
//! * the core is a black box behind the `Core` trait: load a program, advance
//!   by virtual time (microseconds), read a one-byte-per-pixel frame, take key
//!   events, read/write registers
//! * host refreshes arrive with millisecond timestamps; the timing
//!   accumulator turns them into microsecond deltas and never hands out a
//!   negative one
//! * all core access goes through one shared session lock, so loads, resets
//!   and register writes never land in the middle of an advance
//! * abstract display so can plug alternatives; starting with TUI in-console
//! * input device maps host keys onto the hex keypad; unmapped keys are dropped
//!
//! Model
//!
//! Driver
//!  |-- session(core, timing accumulator, frame valid?)
//!  |-- program loader ------> session
//!  |-- input router --------> session
//!  |-- debug bridge --------> session
//!  `-- render pump(session, control)
//!       |-- wait for scheduler refresh(timestamp)
//!       |-- lock session
//!       |     |-- elapsed = timing.tick(timestamp)
//!       |     |-- core.advance(elapsed)
//!       |     `-- display.draw(core.frame_buffer())
//!       `-- unless cancelled, go again
pub mod config;
pub mod debug;
pub mod display;
pub mod driver;
pub mod emu;
pub mod error;
pub mod input;
pub mod keymap;
pub mod loader;
pub mod machine;
pub mod memory;
pub mod pump;
pub mod scheduler;
pub mod session;
pub mod timing;

pub use crate::driver::Driver;
pub use crate::emu::{Core, Key, KeyState, Registers};
pub use crate::error::{Error, OversizedProgram, Result};
