#![no_std]

pub mod event;
pub mod hx711;
pub mod indicator;
pub mod router;
pub mod scheduler;
pub mod service;

pub use event::{EventQueue, EventReceiver, EventSender, ScaleEvent};
pub use hx711::{
    DEFAULT_SAMPLES, DEFAULT_TIMINGS, DriverTimings, Gain, Hx711, Hx711Config, ReadinessTimeout,
};
pub use indicator::{IndicatorState, LedIndicator, Rgb, StatusIndicator};
pub use router::{Endpoint, Method, Response, Router, Status};
pub use scheduler::{DelayScheduler, Scheduler};
pub use service::{ScaleService, ServiceConfig};

pub use embassy_time::{Duration, Instant};

/// Abstract weight sensor
///
/// The read surface the service layer needs from a load cell.
/// [`Hx711`] implements it; tests and other front-ends can substitute their own.
pub trait WeightSensor {
    /// Capture the current load as the zero reference, averaging `samples` reads
    fn tare(&mut self, samples: u8);

    /// Tare-relative weight in calibrated units, averaged over `samples` reads
    fn calibrated_reading(&mut self, samples: u8) -> f32;
}
