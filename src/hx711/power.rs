use core::convert::Infallible;

use embedded_hal::digital::{InputPin, OutputPin};

use super::Hx711;
use crate::scheduler::Scheduler;

impl<CLK, DATA, S> Hx711<CLK, DATA, S>
where
    CLK: OutputPin<Error = Infallible>,
    DATA: InputPin<Error = Infallible>,
    S: Scheduler,
{
    /// Put the chip into power-down mode.
    ///
    /// A pending conversion is consumed first so `DOUT` is high, then
    /// `PD_SCK` is held high past the 60 µs threshold and left there.
    pub fn power_down(&mut self) {
        if self.is_ready() {
            let _ = self.read_once();
        }
        self.clock_high();
        self.scheduler.delay_us(self.timings.power_down_us);
    }

    /// Wake the chip up.
    ///
    /// The first conversion after wake-up is stale, so it is read and
    /// discarded if it shows up within `power_up_timeout`. That read also
    /// latches the configured gain, which the chip resets on power-down.
    pub fn power_up(&mut self) {
        self.clock_low();
        self.scheduler.delay_us(self.timings.power_up_settle_us);
        if self.wait_ready(self.timings.power_up_timeout).is_ok() {
            let _ = self.read_once();
        }
    }
}
