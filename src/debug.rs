use tracing::debug;

use crate::emu::{Core, Registers};
use crate::error::{Error, Result};
use crate::session::SharedSession;

/// Inspect and override the core's register file from outside the render
/// loop. Both directions take the session lock, so neither overlaps an
/// advance.
pub struct DebugBridge<C> {
    session: SharedSession<C>,
}

impl<C: Core> DebugBridge<C> {
    pub fn new(session: SharedSession<C>) -> Self {
        DebugBridge { session }
    }

    pub fn read_registers(&self) -> Registers {
        self.session.lock().core().registers()
    }

    /// replace the whole register file; build partial snapshots with
    /// `..Registers::default()` so untouched fields are zero
    pub fn write_registers(&self, registers: Registers) {
        debug!(?registers, "overriding registers");
        self.session.lock().core_mut().set_registers(registers);
    }

    /// write a snapshot given as TOML; omitted fields are zero
    pub fn write_registers_toml(&self, snapshot: &str) -> Result<Registers> {
        let registers: Registers = toml::from_str(snapshot).map_err(Error::Registers)?;
        self.write_registers(registers.clone());
        Ok(registers)
    }

    /// the current register file as TOML
    pub fn dump_registers(&self) -> String {
        let registers = self.read_registers();
        // a struct of integers always serialises
        toml::to_string(&registers).unwrap_or_default()
    }
}
