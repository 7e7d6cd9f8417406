use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{error, info, warn};

use crate::debug::DebugBridge;
use crate::emu::Core;
use crate::error::Result;
use crate::input::{HostEvent, InputRouter};
use crate::keymap::KeyLayout;
use crate::loader::ProgramLoader;
use crate::pump::{PumpControl, RenderPump};
use crate::session::SharedSession;

/// One core and everything that talks to it. The pieces it hands out share
/// the same session, so they can live on different threads and still never
/// overlap an advance.
pub struct Driver<C> {
    session: SharedSession<C>,
    control: PumpControl,
    layout: KeyLayout,
    /// the last program file loaded successfully, for `HostEvent::Reload`
    program_path: Arc<Mutex<Option<PathBuf>>>,
}

impl<C: Core> Driver<C> {
    pub fn new(core: C, layout: KeyLayout) -> Self {
        Driver {
            session: SharedSession::new(core),
            control: PumpControl::new(),
            layout,
            program_path: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_seed(seed: u64, layout: KeyLayout) -> Self {
        info!(seed, "constructing core");
        Self::new(C::with_seed(seed), layout)
    }

    pub fn session(&self) -> &SharedSession<C> {
        &self.session
    }

    pub fn control(&self) -> &PumpControl {
        &self.control
    }

    pub fn loader(&self) -> ProgramLoader<C> {
        ProgramLoader::new(self.session.clone())
    }

    pub fn debug(&self) -> DebugBridge<C> {
        DebugBridge::new(self.session.clone())
    }

    pub fn input(&self) -> InputRouter<C> {
        InputRouter::new(self.session.clone(), self.layout)
    }

    /// load a program file and remember it for reloading
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.loader().load_file(path)?;
        *self.program_path() = Some(path.to_path_buf());
        Ok(())
    }

    /// load the remembered program file again; it is read afresh
    pub fn reload(&self) -> Result<bool> {
        let path = self.program_path().clone();
        match path {
            Some(path) => {
                self.loader().load_file(&path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn program_path(&self) -> MutexGuard<'_, Option<PathBuf>> {
        self.program_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn render_pump(&self) -> RenderPump<C> {
        RenderPump::new(self.session.clone(), self.control.clone())
    }

    /// act on a host event; false once the host asked to quit
    pub fn handle_host_event(&self, event: HostEvent) -> bool {
        match event {
            HostEvent::Key { code, state } => {
                self.input().key_event(code, state);
            }
            HostEvent::Start => {
                self.control.start();
            }
            HostEvent::Reset => self.loader().reset(),
            HostEvent::Reload => match self.reload() {
                Ok(true) => {}
                Ok(false) => warn!("no program file to reload"),
                Err(e) => error!(%e, "reload failed"),
            },
            HostEvent::DumpRegisters => {
                info!(registers = %self.debug().dump_registers(), "register dump");
            }
            HostEvent::Quit => {
                self.control.cancel();
                return false;
            }
        }
        true
    }
}

impl<C> Clone for Driver<C> {
    fn clone(&self) -> Self {
        Driver {
            session: self.session.clone(),
            control: self.control.clone(),
            layout: self.layout,
            program_path: Arc::clone(&self.program_path),
        }
    }
}
