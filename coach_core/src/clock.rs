//! Time source for the tick driver, swappable for a manual clock in tests.

use std::time::Duration;

pub trait Clock {
    /// Block until `duration` has passed
    fn sleep(&mut self, duration: Duration);
}

/// Wall clock backed by `std::thread::sleep`
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
