use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::emu::Core;
use crate::error::Result;
use crate::session::SharedSession;

/// Hands program images to the core. Loads and resets take the session
/// lock, so they never land in the middle of an advance, and they restart
/// the timing baseline so the fresh program doesn't inherit stale time.
pub struct ProgramLoader<C> {
    session: SharedSession<C>,
}

impl<C: Core> ProgramLoader<C> {
    pub fn new(session: SharedSession<C>) -> Self {
        ProgramLoader { session }
    }

    /// load a chip8 program. An oversized image is refused and the core,
    /// its frame and the timing baseline stay as they were.
    pub fn load(&self, program: &[u8]) -> Result<()> {
        let mut session = self.session.lock();
        if let Err(e) = session.core_mut().load(program) {
            warn!(size = e.size, capacity = e.capacity, "program rejected");
            return Err(e.into());
        }
        session.invalidate();
        info!(size = program.len(), "program loaded");
        Ok(())
    }

    /// load everything the reader yields
    pub fn load_from(&self, reader: &mut impl Read) -> Result<()> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.load(&buf)
    }

    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!(?path, "reading program");
        let program = fs::read(path)?;
        self.load(&program)
    }

    /// clear the core back to power-on state; the program must be loaded again
    pub fn reset(&self) {
        let mut session = self.session.lock();
        session.core_mut().reset();
        session.invalidate();
        info!("core reset");
    }
}
