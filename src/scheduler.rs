//! Platform timing services consumed by the driver.
//!
//! The HX711 has no clocking hardware of its own, so the host has to provide
//! three things: a monotonic tick source, a microsecond busy delay for the
//! bit pulses, and a way to give the CPU away while waiting for a conversion.

use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;

/// Default scheduling quantum (one RTOS tick at 1 kHz).
pub const DEFAULT_QUANTUM: Duration = Duration::from_millis(1);

/// Timing primitives provided by the platform.
pub trait Scheduler {
    /// Current value of the monotonic tick source
    fn now(&self) -> Instant;

    /// Suspend the calling task for at least one scheduling quantum.
    ///
    /// Lower-priority tasks (the idle task feeding the watchdog, for example)
    /// must be able to run while the caller is suspended.
    fn yield_quantum(&mut self);

    /// Busy-wait for `us` microseconds without yielding
    fn delay_us(&mut self, us: u32);
}

/// [`Scheduler`] built on an `embedded-hal` delay and the `embassy-time` clock.
///
/// The delay implementation is expected to suspend the task for
/// millisecond-scale waits, as RTOS-backed delays do (`vTaskDelay` under
/// ESP-IDF). A pure spin delay still works but starves lower priorities.
pub struct DelayScheduler<D> {
    delay: D,
    quantum: Duration,
}

impl<D: DelayNs> DelayScheduler<D> {
    /// Create a scheduler with the [`DEFAULT_QUANTUM`]
    pub const fn new(delay: D) -> Self {
        Self::with_quantum(delay, DEFAULT_QUANTUM)
    }

    /// Create a scheduler with a custom quantum (e.g. 10 ms for a 100 Hz tick)
    pub const fn with_quantum(delay: D, quantum: Duration) -> Self {
        Self { delay, quantum }
    }

    /// Length of one yield
    pub const fn quantum(&self) -> Duration {
        self.quantum
    }

    /// Give back the wrapped delay
    pub fn release(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> Scheduler for DelayScheduler<D> {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn yield_quantum(&mut self) {
        let us = u32::try_from(self.quantum.as_micros()).unwrap_or(u32::MAX);
        self.delay.delay_us(us.max(1));
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}
