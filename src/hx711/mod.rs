//! HX711 24-bit load cell ADC driver
//!
//! The chip has no bus hardware: the host bit-bangs `PD_SCK` and samples
//! `DOUT` on every rising edge. Calibration (tare offset and scale factor)
//! lives here as well, so a single instance is everything needed to turn
//! clock pulses into physical units.
//!
//! Every failure path is a readiness timeout. Raw reads degrade to a zero
//! sample instead of propagating the timeout, and the number of timeouts
//! seen so far is kept in [`Hx711::timeouts`].

mod gain;
mod power;
mod protocol;

use core::convert::Infallible;

use embassy_time::Duration;
use embedded_hal::digital::{InputPin, OutputPin};

#[cfg(feature = "esp32-log")]
use esp_println::println;

pub use gain::Gain;

use crate::WeightSensor;
use crate::scheduler::Scheduler;

/// Sample count used when the caller does not pass one
pub const DEFAULT_SAMPLES: u8 = 10;

/// The chip did not pull `DOUT` low within the allotted window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessTimeout;

/// Protocol timings
///
/// The microsecond values are busy delays executed on the calling task.
/// The durations bound the cooperative readiness waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverTimings {
    /// Clock-low hold before the first bit of a read
    pub settle_us: u32,
    /// Minimum high and low time of each clock pulse
    pub pulse_us: u32,
    /// Clock-high hold that puts the chip into power-down (must exceed 60 µs)
    pub power_down_us: u32,
    /// Clock-low hold after waking the chip
    pub power_up_settle_us: u32,
    /// Readiness wait of a regular raw read
    pub read_timeout: Duration,
    /// Readiness wait when pushing a new gain selection into effect
    pub gain_sync_timeout: Duration,
    /// Readiness wait for the stale conversion after wake-up
    pub power_up_timeout: Duration,
}

/// Timings matching the HX711 datasheet with some margin
pub const DEFAULT_TIMINGS: DriverTimings = DriverTimings {
    settle_us: 1,
    pulse_us: 1,
    power_down_us: 80,
    power_up_settle_us: 100,
    read_timeout: Duration::from_millis(1000),
    gain_sync_timeout: Duration::from_millis(5),
    power_up_timeout: Duration::from_millis(100),
};

impl Default for DriverTimings {
    fn default() -> Self {
        DEFAULT_TIMINGS
    }
}

/// Configuration for the driver
#[derive(Debug, Clone, Copy)]
pub struct Hx711Config {
    pub gain: Gain,
    pub scale: f32,
    pub timings: DriverTimings,
}

impl Default for Hx711Config {
    fn default() -> Self {
        Self {
            gain: Gain::default(),
            scale: 1.0,
            timings: DEFAULT_TIMINGS,
        }
    }
}

/// HX711 driver bound to a clock output, a data input and the platform scheduler
pub struct Hx711<CLK, DATA, S> {
    // Hardware
    clock: CLK,
    data: DATA,
    scheduler: S,
    timings: DriverTimings,

    // Chip and calibration state
    gain: Gain,
    tare: i32,
    scale: f32,
    timeouts: u32,
}

impl<CLK, DATA, S> Hx711<CLK, DATA, S>
where
    CLK: OutputPin<Error = Infallible>,
    DATA: InputPin<Error = Infallible>,
    S: Scheduler,
{
    /// Bind the driver to its lines.
    ///
    /// Nothing is sent to the chip until [`Hx711::init`] is called.
    pub fn new(clock: CLK, data: DATA, scheduler: S, config: &Hx711Config) -> Self {
        Self {
            clock,
            data,
            scheduler,
            timings: config.timings,
            gain: config.gain,
            tare: 0,
            scale: non_zero_scale(config.scale),
            timeouts: 0,
        }
    }

    /// Wake the chip and latch the configured gain.
    pub fn init(&mut self) {
        self.clock_low();
        self.power_up();
        self.sync_gain();

        #[cfg(feature = "esp32-log")]
        println!(
            "[Hx711.init] gain: {}, tare: {}, scale: {}",
            self.gain.as_str(),
            self.tare,
            self.scale
        );
    }

    /// Read one sample, waiting up to `read_timeout` for the chip.
    ///
    /// Returns `0` on timeout. A zero here does not mean zero load: check
    /// [`Hx711::timeouts`] or use [`Hx711::try_read_raw`] to tell them apart.
    pub fn read_raw(&mut self) -> i32 {
        self.try_read_raw().unwrap_or(0)
    }

    /// Read one sample, reporting a timeout instead of substituting zero.
    pub fn try_read_raw(&mut self) -> Result<i32, ReadinessTimeout> {
        if let Err(err) = self.wait_ready(self.timings.read_timeout) {
            self.timeouts = self.timeouts.saturating_add(1);
            #[cfg(feature = "esp32-log")]
            println!("[Hx711.read_raw] chip not ready, timeouts: {}", self.timeouts);
            return Err(err);
        }
        Ok(self.read_once())
    }

    /// Truncated mean of `times` raw reads.
    ///
    /// Timed out reads take part in the mean as zero samples.
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_average(&mut self, times: u8) -> i32 {
        if times == 0 {
            return 0;
        }
        let sum: i64 = (0..times).map(|_| i64::from(self.read_raw())).sum();
        // The mean of i32 samples is always within i32
        (sum / i64::from(times)) as i32
    }

    /// Use the current load as the zero reference
    pub fn tare(&mut self, times: u8) {
        self.tare = self.read_average(times);

        #[cfg(feature = "esp32-log")]
        println!("[Hx711.tare] tare: {}", self.tare);
    }

    /// Set the counts-per-unit divisor.
    ///
    /// Zero, subnormal and non-finite values are replaced with `1.0`.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = non_zero_scale(scale);
    }

    /// Tare-relative reading in physical units, averaged over `times` samples
    #[allow(clippy::cast_precision_loss)]
    pub fn get_units(&mut self, times: u8) -> f32 {
        let net = i64::from(self.read_average(times)) - i64::from(self.tare);
        net as f32 / self.scale
    }

    /// [`Hx711::get_units`] over [`DEFAULT_SAMPLES`] samples
    pub fn get_units_default(&mut self) -> f32 {
        self.get_units(DEFAULT_SAMPLES)
    }

    /// Select a new channel/gain pair.
    ///
    /// The selection is only latched by the trailing pulses of a read, so a
    /// throwaway read is made right away when the chip has (or shortly gets)
    /// a conversion ready. Otherwise the next regular read applies it.
    pub fn set_gain(&mut self, gain: Gain) {
        self.gain = gain;
        self.sync_gain();
    }

    pub const fn gain(&self) -> Gain {
        self.gain
    }

    pub const fn tare_offset(&self) -> i32 {
        self.tare
    }

    /// Restore a previously captured tare offset
    pub fn set_tare_offset(&mut self, tare: i32) {
        self.tare = tare;
    }

    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Number of raw reads that timed out since construction
    pub const fn timeouts(&self) -> u32 {
        self.timeouts
    }

    /// Release the lines and the scheduler
    pub fn release(self) -> (CLK, DATA, S) {
        (self.clock, self.data, self.scheduler)
    }
}

impl<CLK, DATA, S> WeightSensor for Hx711<CLK, DATA, S>
where
    CLK: OutputPin<Error = Infallible>,
    DATA: InputPin<Error = Infallible>,
    S: Scheduler,
{
    fn tare(&mut self, samples: u8) {
        Hx711::tare(self, samples);
    }

    fn calibrated_reading(&mut self, samples: u8) -> f32 {
        self.get_units(samples)
    }
}

fn non_zero_scale(scale: f32) -> f32 {
    if scale.is_normal() { scale } else { 1.0 }
}
