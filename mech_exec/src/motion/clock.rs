//! Time source for the control loop

use std::{
    thread,
    time::{Duration, Instant},
};

/// Monotonic time source and sleep used to pace playback.
pub trait Clock {
    /// The current monotonic time.
    fn now(&self) -> Instant;

    /// Block for `duration`.
    fn sleep(&self, duration: Duration);
}

/// The system's monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration)
    }
}
