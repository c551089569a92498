//! Signals the scale service reacts to.
//!
//! Events are posted from whatever context the platform raises them in
//! (Wi-Fi callbacks, the init sequence) and drained by the task that owns
//! the [`ScaleService`](crate::ScaleService). The queue is a bounded
//! `heapless::Deque` guarded by a critical section, so posting from an
//! interrupt handler is fine.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

/// Signals raised outside of the scale core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleEvent {
    /// The station got an address, the API can be served
    NetworkUp,
    /// The station lost its access point
    NetworkDown,
    /// Peripherals are ready, capture the tare baseline.
    ///
    /// Fires once per boot. Repeated triggers are ignored by the service.
    Calibrate,
}

/// The queue was full, the event was not posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrySendError(pub ScaleEvent);

/// No event is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryReceiveError;

/// Pending [`ScaleEvent`]s, oldest first.
///
/// Network callbacks post into it and the service task drains it, so it
/// normally lives in a `static`:
///
/// ```ignore
/// static EVENTS: EventQueue<8> = EventQueue::new();
/// ```
pub struct EventQueue<const SIZE: usize> {
    inner: Mutex<RefCell<Deque<ScaleEvent, SIZE>>>,
}

impl<const SIZE: usize> EventQueue<SIZE> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Handle for Wi-Fi callbacks and the init sequence
    pub const fn sender(&self) -> EventSender<'_, SIZE> {
        EventSender { queue: self }
    }

    /// Handle for the task owning the service
    pub const fn receiver(&self) -> EventReceiver<'_, SIZE> {
        EventReceiver { queue: self }
    }

    pub fn try_send(&self, event: ScaleEvent) -> Result<(), TrySendError> {
        self.locked(|queue| queue.push_back(event).map_err(TrySendError))
    }

    pub fn try_receive(&self) -> Result<ScaleEvent, TryReceiveError> {
        self.locked(|queue| queue.pop_front().ok_or(TryReceiveError))
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn locked<R>(&self, f: impl FnOnce(&mut Deque<ScaleEvent, SIZE>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow(cs).borrow_mut()))
    }
}

impl<const SIZE: usize> Default for EventQueue<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

/// Posts events, one helper per signal
#[derive(Clone, Copy)]
pub struct EventSender<'a, const SIZE: usize> {
    queue: &'a EventQueue<SIZE>,
}

impl<const SIZE: usize> EventSender<'_, SIZE> {
    pub fn try_send(&self, event: ScaleEvent) -> Result<(), TrySendError> {
        self.queue.try_send(event)
    }

    /// Station got an address
    pub fn network_up(&self) -> Result<(), TrySendError> {
        self.try_send(ScaleEvent::NetworkUp)
    }

    /// Station disconnected
    pub fn network_down(&self) -> Result<(), TrySendError> {
        self.try_send(ScaleEvent::NetworkDown)
    }

    pub fn calibrate(&self) -> Result<(), TrySendError> {
        self.try_send(ScaleEvent::Calibrate)
    }
}

/// Drains events, see [`ScaleService::process_pending`](crate::ScaleService::process_pending)
#[derive(Clone, Copy)]
pub struct EventReceiver<'a, const SIZE: usize> {
    queue: &'a EventQueue<SIZE>,
}

impl<const SIZE: usize> EventReceiver<'_, SIZE> {
    pub fn try_receive(&self) -> Result<ScaleEvent, TryReceiveError> {
        self.queue.try_receive()
    }
}
