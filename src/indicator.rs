//! Status indicator sink
//!
//! The board has a single addressable RGB LED. The scale only tells it two
//! things: calibration is running, or the scale is idle.

use smart_leds::{RGB8, SmartLedsWrite};

pub type Rgb = RGB8;

/// LED off
pub const COLOR_NONE: Rgb = Rgb { r: 0, g: 0, b: 0 };

/// Calibration in progress
pub const COLOR_ORANGE: Rgb = Rgb {
    r: 255,
    g: 128,
    b: 0,
};

/// Number of pixels on the status LED strip
pub const STATUS_LED_COUNT: usize = 1;

/// Abstract status indicator
///
/// Implement this trait for whatever shows the device state to the user.
pub trait StatusIndicator {
    /// Show a color
    fn set_color(&mut self, color: Rgb);
}

/// What the indicator currently reflects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    /// Nothing running
    Idle,
    /// Tare in progress
    Calibrating,
}

impl IndicatorState {
    pub const fn color(self) -> Rgb {
        match self {
            Self::Idle => COLOR_NONE,
            Self::Calibrating => COLOR_ORANGE,
        }
    }
}

/// [`StatusIndicator`] over any `smart-leds` writer.
///
/// Every pixel of the strip is set to the same color.
pub struct LedIndicator<W> {
    writer: W,
}

impl<W> LedIndicator<W>
where
    W: SmartLedsWrite,
    W::Color: From<Rgb>,
{
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W> StatusIndicator for LedIndicator<W>
where
    W: SmartLedsWrite,
    W::Color: From<Rgb>,
{
    fn set_color(&mut self, color: Rgb) {
        // Refresh errors are dropped, the indicator has no error path
        let _ = self.writer.write([color; STATUS_LED_COUNT]);
    }
}
