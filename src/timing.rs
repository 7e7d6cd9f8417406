use tracing::trace;

/// host timestamps are milliseconds, the core counts microseconds
pub const MICROS_PER_MILLI: f64 = 1000.0;

/// Turns host refresh timestamps (milliseconds, fractional) into the
/// microsecond deltas a core is advanced by.
///
/// The first tick after construction or after a discontinuity only sets the
/// baseline. A timestamp that doesn't move forward does the same, so a
/// negative delta can never reach the core.
#[derive(Debug, Default, Clone)]
pub struct TimingAccumulator {
    previous: Option<f64>,
    total: u64,
}

impl TimingAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// elapsed virtual time since the previous tick, truncated toward zero
    pub fn tick(&mut self, now: f64) -> u64 {
        if !now.is_finite() {
            trace!(now, "non-finite timestamp, dropping baseline");
            self.previous = None;
            return 0;
        }
        let Some(previous) = self.previous.replace(now) else {
            trace!(now, "timing baseline set");
            return 0;
        };
        if now <= previous {
            trace!(now, previous, "timestamp regression, new baseline");
            return 0;
        }
        let elapsed = ((now - previous) * MICROS_PER_MILLI) as u64;
        self.total = self.total.saturating_add(elapsed);
        elapsed
    }

    /// forget the baseline; the next tick yields zero
    pub fn mark_discontinuity(&mut self) {
        trace!("timing discontinuity");
        self.previous = None;
        self.total = 0;
    }

    /// whether the next tick will only set a baseline
    pub fn is_baseline_pending(&self) -> bool {
        self.previous.is_none()
    }

    /// virtual time handed out since the last discontinuity
    pub fn elapsed_total(&self) -> u64 {
        self.total
    }
}
