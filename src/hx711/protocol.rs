//! Bit-level transfer
//!
//! Frame layout, clocked by the host:
//! - 24 data pulses, MSB first, `DOUT` valid while `PD_SCK` is high
//! - 1..=3 trailing pulses selecting the gain of the next conversion
//!
//! Holding `PD_SCK` high for more than 60 µs powers the chip down, so any
//! stall inside the data pulses resets the output register. The data pulses
//! therefore run with interrupts masked.

use core::convert::Infallible;

use embassy_time::Duration;
use embedded_hal::digital::{InputPin, OutputPin};

use super::{Hx711, ReadinessTimeout};
use crate::scheduler::Scheduler;

/// Number of data bits in one conversion
const DATA_BITS: u8 = 24;

/// Sign bit of the 24-bit output, inverted by the chip
const SIGN_BIT: u32 = 0x80_0000;

impl<CLK, DATA, S> Hx711<CLK, DATA, S>
where
    CLK: OutputPin<Error = Infallible>,
    DATA: InputPin<Error = Infallible>,
    S: Scheduler,
{
    /// Check if a conversion is ready (`DOUT` low). Never blocks.
    pub fn is_ready(&mut self) -> bool {
        let Ok(low) = self.data.is_low();
        low
    }

    /// Poll for readiness, yielding one scheduling quantum per unready poll.
    ///
    /// Gives up once `timeout` has elapsed on the scheduler clock, so the
    /// call never lasts longer than `timeout` plus one quantum.
    pub fn wait_ready(&mut self, timeout: Duration) -> Result<(), ReadinessTimeout> {
        let start = self.scheduler.now();
        loop {
            if self.is_ready() {
                return Ok(());
            }
            if self.scheduler.now().saturating_duration_since(start) >= timeout {
                return Err(ReadinessTimeout);
            }
            self.scheduler.yield_quantum();
        }
    }

    /// Clock out one conversion and latch the gain for the next one.
    ///
    /// The caller is responsible for checking readiness first. The result is
    /// the 24-bit output with bit 23 flipped, in the low bits of an `i32`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_once(&mut self) -> i32 {
        self.clock_low();
        self.scheduler.delay_us(self.timings.settle_us);

        let pulse_us = self.timings.pulse_us;
        let value = critical_section::with(|_| {
            let mut value: u32 = 0;
            for _ in 0..DATA_BITS {
                self.clock_high();
                self.scheduler.delay_us(pulse_us);
                let Ok(high) = self.data.is_high();
                value = (value << 1) | u32::from(high);
                self.clock_low();
                self.scheduler.delay_us(pulse_us);
            }
            value
        });

        self.gain_pulses();

        // 24 bits always fit, no sign extension
        (value ^ SIGN_BIT) as i32
    }

    /// Push the current gain into effect with a throwaway read if possible.
    pub(super) fn sync_gain(&mut self) {
        if self.is_ready() || self.wait_ready(self.timings.gain_sync_timeout).is_ok() {
            let _ = self.read_once();
        }
    }

    fn gain_pulses(&mut self) {
        let pulse_us = self.timings.pulse_us;
        for _ in 0..self.gain.pulses() {
            self.clock_high();
            self.scheduler.delay_us(pulse_us);
            self.clock_low();
            self.scheduler.delay_us(pulse_us);
        }
    }

    pub(super) fn clock_high(&mut self) {
        let Ok(()) = self.clock.set_high();
    }

    pub(super) fn clock_low(&mut self) {
        let Ok(()) = self.clock.set_low();
    }
}
