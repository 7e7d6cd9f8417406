use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::emu::Core;
use crate::timing::TimingAccumulator;

/// Everything that must change together when the core is touched: the core
/// itself, the timing baseline feeding it and whether its frame buffer may
/// be read.
pub struct Session<C> {
    core: C,
    timing: TimingAccumulator,
    frame_valid: bool,
}

impl<C: Core> Session<C> {
    pub fn new(core: C) -> Self {
        Session {
            core,
            timing: TimingAccumulator::new(),
            frame_valid: false,
        }
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    /// direct access for load/reset/register writes. The frame and the
    /// timing baseline are not touched; see `invalidate`.
    pub(crate) fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    pub fn timing(&self) -> &TimingAccumulator {
        &self.timing
    }

    /// the core's program state was replaced: stale time must not reach it
    /// and its frame buffer may have moved
    pub fn invalidate(&mut self) {
        self.timing.mark_discontinuity();
        self.frame_valid = false;
    }

    /// advance the core by the time since the previous refresh
    pub fn advance_to(&mut self, now: f64) -> u64 {
        let elapsed = self.timing.tick(now);
        self.core.advance(elapsed);
        self.frame_valid = true;
        elapsed
    }

    /// the core's frame, if it has been advanced since the last load/reset
    pub fn frame(&self) -> Option<&[u8]> {
        self.frame_valid.then(|| self.core.frame_buffer())
    }

    pub fn frame_size(&self) -> (usize, usize) {
        (self.core.frame_width(), self.core.frame_height())
    }
}

/// A session shared between the render pump and whoever delivers input,
/// loads and debug requests. Holding the guard is the only way to reach the
/// core, so none of those can interleave with an advance.
pub struct SharedSession<C> {
    inner: Arc<Mutex<Session<C>>>,
}

impl<C: Core> SharedSession<C> {
    pub fn new(core: C) -> Self {
        SharedSession {
            inner: Arc::new(Mutex::new(Session::new(core))),
        }
    }

    /// A panic while the guard was held leaves a session that is still
    /// consistent (each field is replaced wholesale), so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, Session<C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> Clone for SharedSession<C> {
    fn clone(&self) -> Self {
        SharedSession {
            inner: Arc::clone(&self.inner),
        }
    }
}
