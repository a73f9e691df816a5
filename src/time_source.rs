//! Where clocks read the current instant from.
//!
//! Games use [`MonotonicTime`]. [`ManualTime`] only moves when told to, which lets tests play
//! a one-minute game in a few milliseconds.

use std::{
    fmt::Debug,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

pub trait TimeSource: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// The OS monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicTime;

impl TimeSource for MonotonicTime {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Simulated time, frozen until [`ManualTime::advance`] is called.
#[derive(Debug)]
pub struct ManualTime {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        self.origin + offset
    }
}
