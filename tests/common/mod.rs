//! Simulated HX711 and scheduler sharing one virtual microsecond clock.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use myrtio_load_cell::{Duration, Hx711, Hx711Config, Instant, Scheduler};

/// Pulses of one conversion's data field
const DATA_PULSES: u32 = 24;

/// Clock-high hold after which the chip powers down
const POWER_DOWN_US: u64 = 60;

/// How long another thread gets to enter the critical section before the
/// caller is considered to be holding it
const MASK_PROBE_WAIT: std::time::Duration = std::time::Duration::from_millis(50);

/// Virtual time in microseconds
pub type Clock = Rc<Cell<u64>>;

pub type SimHx711 = Hx711<SimClockPin, SimDataPin, SimScheduler>;

/// Convert a wanted raw reading to what the chip puts on the wire
#[allow(clippy::cast_sign_loss)]
pub fn wire_pattern(raw: i32) -> u32 {
    (raw as u32 ^ 0x80_0000) & 0xFF_FFFF
}

/// One clocked conversion as seen by the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub pattern: u32,
    pub pulses: u32,
}

impl Frame {
    /// Pulses after the data field (the gain selection)
    pub fn trailing(&self) -> u32 {
        self.pulses.saturating_sub(DATA_PULSES)
    }
}

/// Clock transition, with whether the critical section was held at that point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub high: bool,
    pub masked: bool,
}

/// Whether the calling thread holds the global critical section.
///
/// The host implementation is one process-wide lock, so a helper thread
/// stays blocked on it for as long as the caller is inside.
fn critical_section_held() -> bool {
    let (done, finished) = mpsc::channel();
    thread::spawn(move || {
        critical_section::with(|_| ());
        let _ = done.send(());
    });
    finished.recv_timeout(MASK_PROBE_WAIT).is_err()
}

/// HX711 model driven by clock edges
pub struct SimChip {
    now: Clock,
    patterns: Vec<u32>,
    next: usize,
    in_frame: bool,
    clock_high: bool,
    clock_high_since: u64,
    dout: bool,
    pub frames: Vec<Frame>,
    pub wakeups: u32,
    track_masking: bool,
    pub edges: Vec<Edge>,
}

impl SimChip {
    fn new(now: Clock, patterns: &[u32]) -> Self {
        Self {
            now,
            patterns: patterns.to_vec(),
            next: 0,
            in_frame: false,
            clock_high: false,
            clock_high_since: 0,
            dout: true,
            frames: Vec::new(),
            wakeups: 0,
            track_masking: false,
            edges: Vec::new(),
        }
    }

    /// Pattern of the pending conversion. The last one repeats forever.
    fn pending(&self) -> Option<u32> {
        let last = self.patterns.len().checked_sub(1)?;
        Some(self.patterns[self.next.min(last)])
    }

    pub fn powered_down(&self) -> bool {
        self.clock_high && self.now.get() - self.clock_high_since > POWER_DOWN_US
    }

    pub fn clock_is_high(&self) -> bool {
        self.clock_high
    }

    fn set_clock(&mut self, high: bool, masked: Option<bool>) {
        if high == self.clock_high {
            return;
        }
        if let Some(masked) = masked {
            self.edges.push(Edge { high, masked });
        }
        self.clock_high = high;
        if high {
            self.clock_high_since = self.now.get();
            self.rising_edge();
        } else if self.now.get() - self.clock_high_since > POWER_DOWN_US {
            // Woken up. The long pulse was the power-down, not a data pulse.
            self.wakeups += 1;
            if self.in_frame {
                if let Some(frame) = self.frames.last_mut() {
                    frame.pulses -= 1;
                    if frame.pulses >= DATA_PULSES {
                        self.next += 1;
                    }
                }
                self.in_frame = false;
            }
        }
    }

    fn rising_edge(&mut self) {
        if !self.in_frame {
            let Some(pattern) = self.pending() else {
                return;
            };
            self.in_frame = true;
            self.frames.push(Frame { pattern, pulses: 0 });
        }
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        frame.pulses += 1;
        self.dout = if frame.pulses <= DATA_PULSES {
            (frame.pattern >> (DATA_PULSES - frame.pulses)) & 1 == 1
        } else {
            true
        };
    }

    /// Level of `DOUT`
    fn data_high(&mut self) -> bool {
        if self.clock_high {
            return !self.in_frame || self.dout;
        }
        if self.in_frame {
            let complete = self
                .frames
                .last()
                .is_some_and(|f| f.pulses >= DATA_PULSES);
            if !complete {
                return self.dout;
            }
            self.in_frame = false;
            self.next += 1;
        }
        self.pending().is_none()
    }
}

pub struct SimClockPin(Rc<RefCell<SimChip>>);

impl SimClockPin {
    fn drive(&mut self, high: bool) {
        let tracking = self.0.borrow().track_masking;
        let masked = tracking.then(critical_section_held);
        self.0.borrow_mut().set_clock(high, masked);
    }
}

impl ErrorType for SimClockPin {
    type Error = Infallible;
}

impl OutputPin for SimClockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

pub struct SimDataPin(Rc<RefCell<SimChip>>);

impl ErrorType for SimDataPin {
    type Error = Infallible;
}

impl InputPin for SimDataPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.borrow_mut().data_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.borrow_mut().data_high())
    }
}

/// Scheduler advancing virtual time instead of sleeping
pub struct SimScheduler {
    now: Clock,
    quantum: Duration,
    yields: Rc<Cell<u32>>,
}

impl Scheduler for SimScheduler {
    fn now(&self) -> Instant {
        Instant::from_micros(self.now.get())
    }

    fn yield_quantum(&mut self) {
        self.now.set(self.now.get() + self.quantum.as_micros());
        self.yields.set(self.yields.get() + 1);
    }

    fn delay_us(&mut self, us: u32) {
        self.now.set(self.now.get() + u64::from(us));
    }
}

/// Handles into the simulation, kept by the test
pub struct Rig {
    pub chip: Rc<RefCell<SimChip>>,
    pub now: Clock,
    pub yields: Rc<Cell<u32>>,
}

impl Rig {
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.now.get())
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.chip.borrow().frames.clone()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.chip.borrow().frames.last().copied()
    }

    /// Record every following clock edge together with the masking state.
    /// Each edge then costs up to [`MASK_PROBE_WAIT`] of real time.
    pub fn track_masking(&self) {
        self.chip.borrow_mut().track_masking = true;
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.chip.borrow().edges.clone()
    }
}

/// Driver over a chip presenting `patterns` in turn. Empty means never ready.
pub fn rig_with(config: &Hx711Config, patterns: &[u32]) -> (SimHx711, Rig) {
    let now: Clock = Rc::new(Cell::new(0));
    let yields = Rc::new(Cell::new(0));
    let chip = Rc::new(RefCell::new(SimChip::new(now.clone(), patterns)));
    let scheduler = SimScheduler {
        now: now.clone(),
        quantum: Duration::from_millis(1),
        yields: yields.clone(),
    };
    let driver = Hx711::new(
        SimClockPin(chip.clone()),
        SimDataPin(chip.clone()),
        scheduler,
        config,
    );
    (driver, Rig { chip, now, yields })
}

pub fn rig(patterns: &[u32]) -> (SimHx711, Rig) {
    rig_with(&Hx711Config::default(), patterns)
}

/// Driver over a chip returning the given raw readings
pub fn rig_readings(readings: &[i32]) -> (SimHx711, Rig) {
    let patterns: Vec<u32> = readings.iter().map(|r| wire_pattern(*r)).collect();
    rig(&patterns)
}
