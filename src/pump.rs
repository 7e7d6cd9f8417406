use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::display::Display;
use crate::emu::Core;
use crate::scheduler::Scheduler;
use crate::session::SharedSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PumpState {
    /// waiting for the start trigger
    Idle,
    /// triggered, no refresh handled yet
    Armed,
    Running,
    /// cancelled; never leaves this state
    Stopped,
}

impl PumpState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => PumpState::Idle,
            1 => PumpState::Armed,
            2 => PumpState::Running,
            _ => PumpState::Stopped,
        }
    }
}

/// Start trigger and cancellation for a render pump. Cheap to clone and
/// safe to hand to an input thread.
#[derive(Debug, Clone)]
pub struct PumpControl {
    state: Arc<AtomicU8>,
}

impl PumpControl {
    pub fn new() -> Self {
        PumpControl {
            state: Arc::new(AtomicU8::new(PumpState::Idle as u8)),
        }
    }

    pub fn state(&self) -> PumpState {
        PumpState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// arm the pump. Only an idle pump is armed; triggering an armed,
    /// running or stopped pump does nothing. Returns whether it armed.
    pub fn start(&self) -> bool {
        let armed = self.transition(PumpState::Idle, PumpState::Armed);
        if armed {
            info!("render pump armed");
        } else {
            debug!(state = ?self.state(), "start trigger ignored");
        }
        armed
    }

    /// stop the pump before its next refresh
    pub fn cancel(&self) {
        let previous = self.state.swap(PumpState::Stopped as u8, Ordering::AcqRel);
        if PumpState::from_u8(previous) != PumpState::Stopped {
            info!("render pump cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == PumpState::Stopped
    }

    fn transition(&self, from: PumpState, to: PumpState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for PumpControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives the core from the host's refresh callback: each refresh advances
/// the core by the elapsed virtual time and presents the resulting frame.
pub struct RenderPump<C> {
    session: SharedSession<C>,
    control: PumpControl,
    frames: u64,
}

impl<C: Core> RenderPump<C> {
    pub fn new(session: SharedSession<C>, control: PumpControl) -> Self {
        RenderPump {
            session,
            control,
            frames: 0,
        }
    }

    pub fn control(&self) -> &PumpControl {
        &self.control
    }

    pub fn state(&self) -> PumpState {
        self.control.state()
    }

    /// frames presented so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Handle one refresh. Advance and present happen under one hold of the
    /// session lock, so nobody sees a frame from a half-finished advance and
    /// no load can slip in between. Returns the virtual time applied, or
    /// `None` if the pump isn't armed or running.
    pub fn tick(&mut self, now: f64, display: &mut dyn Display) -> io::Result<Option<u64>> {
        match self.control.state() {
            PumpState::Idle | PumpState::Stopped => return Ok(None),
            PumpState::Armed => {
                if self.control.transition(PumpState::Armed, PumpState::Running) {
                    info!("render pump running");
                }
            }
            PumpState::Running => {}
        }

        let mut session = self.session.lock();
        // cancelled while waiting for the lock
        if self.control.is_cancelled() {
            return Ok(None);
        }
        let elapsed = session.advance_to(now);
        if let Some(frame) = session.frame() {
            display.draw(frame)?;
            self.frames += 1;
        }
        Ok(Some(elapsed))
    }

    /// Keep handling refreshes until cancelled or the scheduler runs dry.
    /// Cancellation is checked before each wait. A display that can't show
    /// the core's frame size, or a display failure, stops the pump and is
    /// returned.
    pub fn run(
        &mut self,
        scheduler: &mut impl Scheduler,
        display: &mut dyn Display,
    ) -> io::Result<()> {
        let frame_size = self.session.lock().frame_size();
        if display.resolution() != frame_size {
            self.control.cancel();
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "display is {:?} but the core draws {:?}",
                    display.resolution(),
                    frame_size
                ),
            ));
        }
        loop {
            if self.control.is_cancelled() {
                break;
            }
            let Some(now) = scheduler.next_frame() else {
                debug!("scheduler has no more refreshes");
                break;
            };
            if let Err(e) = self.tick(now, display) {
                self.control.cancel();
                return Err(e);
            }
        }
        info!(frames = self.frames, "render pump finished");
        Ok(())
    }
}
