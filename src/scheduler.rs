use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// The host's refresh primitive: block until the next refresh and report
/// when it happened, in milliseconds with sub-millisecond precision.
pub trait Scheduler {
    /// `None` once the scheduler has no further refreshes to give
    fn next_frame(&mut self) -> Option<f64>;
}

/// Paces refreshes at a fixed rate using spin_sleep, so short waits stay
/// accurate. Timestamps count from construction.
pub struct RefreshScheduler {
    origin: Instant,
    period: Duration,
    deadline: Instant,
}

impl RefreshScheduler {
    pub fn new(rate_hz: f64) -> Self {
        let origin = Instant::now();
        let period = Duration::from_secs_f64(1.0 / rate_hz.max(1.0));
        RefreshScheduler {
            origin,
            period,
            deadline: origin,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Scheduler for RefreshScheduler {
    fn next_frame(&mut self) -> Option<f64> {
        self.deadline += self.period;
        let now = Instant::now();
        if self.deadline > now {
            spin_sleep::sleep(self.deadline - now);
        } else {
            // fell behind; don't try to catch up with a burst of refreshes
            self.deadline = now;
        }
        Some(self.origin.elapsed().as_secs_f64() * 1000.0)
    }
}

/// Replays a fixed list of timestamps, then runs dry.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    timestamps: VecDeque<f64>,
}

impl ManualScheduler {
    pub fn new(timestamps: impl IntoIterator<Item = f64>) -> Self {
        ManualScheduler {
            timestamps: timestamps.into_iter().collect(),
        }
    }

    pub fn push(&mut self, timestamp: f64) {
        self.timestamps.push_back(timestamp);
    }
}

impl Scheduler for ManualScheduler {
    fn next_frame(&mut self) -> Option<f64> {
        self.timestamps.pop_front()
    }
}
