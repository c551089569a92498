//! Scale service - the long-lived application context
//!
//! Owns the weight sensor, the status indicator and the routing table, and
//! reacts to [`ScaleEvent`]s drained from an [`EventQueue`](crate::EventQueue).
//! The platform keeps one instance for the lifetime of the firmware and
//! hands `&mut` access to its event and HTTP callbacks.

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::WeightSensor;
use crate::event::{EventReceiver, ScaleEvent};
use crate::hx711::DEFAULT_SAMPLES;
use crate::indicator::{IndicatorState, StatusIndicator};
use crate::router::{CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT, Endpoint, Method, Response, Router};

/// Routing table capacity, leaves room for one platform route
pub const ROUTE_CAPACITY: usize = 4;

const INDEX_BODY: &str = "Hello World";
const HEALTH_BODY: &str = r#"{"status": "ok", "version": "1.0"}"#;

/// Configuration for the scale service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Samples averaged for the boot-time tare
    pub tare_samples: u8,
    /// Samples averaged per API reading
    pub reading_samples: u8,
}

pub const DEFAULT_SERVICE_CONFIG: ServiceConfig = ServiceConfig {
    tare_samples: DEFAULT_SAMPLES,
    reading_samples: DEFAULT_SAMPLES,
};

impl Default for ServiceConfig {
    fn default() -> Self {
        DEFAULT_SERVICE_CONFIG
    }
}

/// Scale service
pub struct ScaleService<'a, W, I, const EVENTS: usize> {
    // External dependencies and configuration
    events: EventReceiver<'a, EVENTS>,
    config: ServiceConfig,

    // Owned collaborators
    sensor: W,
    indicator: I,
    router: Router<ROUTE_CAPACITY>,

    // Internal state
    calibrated: bool,
}

impl<'a, W, I, const EVENTS: usize> ScaleService<'a, W, I, EVENTS>
where
    W: WeightSensor,
    I: StatusIndicator,
{
    /// Create the service and register the API routes.
    ///
    /// The server starts stopped; it is started by [`ScaleEvent::NetworkUp`].
    pub fn new(
        events: EventReceiver<'a, EVENTS>,
        sensor: W,
        mut indicator: I,
        config: &ServiceConfig,
    ) -> Self {
        indicator.set_color(IndicatorState::Idle.color());

        let mut router = Router::new();
        // Three routes always fit into ROUTE_CAPACITY
        let _ = router
            .register("/health", Method::Get, Endpoint::Health)
            .and_then(|r| r.register("/", Method::Get, Endpoint::Index))
            .and_then(|r| r.register("/scale", Method::Get, Endpoint::Scale));

        Self {
            events,
            config: *config,
            sensor,
            indicator,
            router,
            calibrated: false,
        }
    }

    /// Handle all pending events (non-blocking)
    ///
    /// Returns the number of events handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_receive() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Apply a single event
    pub fn handle_event(&mut self, event: ScaleEvent) {
        match event {
            ScaleEvent::NetworkUp => {
                if !self.router.start() {
                    return;
                }
                #[cfg(feature = "esp32-log")]
                println!("[ScaleService] network up, serving API");
            }
            ScaleEvent::NetworkDown => {
                if !self.router.stop() {
                    return;
                }
                #[cfg(feature = "esp32-log")]
                println!("[ScaleService] network lost, API stopped");
            }
            ScaleEvent::Calibrate => self.calibrate(),
        }
    }

    /// Answer an HTTP request
    pub fn handle_request(&mut self, method: Method, uri: &str) -> Response {
        match self.router.resolve(method, uri) {
            Ok(Endpoint::Index) => Response::ok(CONTENT_TYPE_TEXT, INDEX_BODY),
            Ok(Endpoint::Health) => Response::ok(CONTENT_TYPE_JSON, HEALTH_BODY),
            Ok(Endpoint::Scale) => {
                let value = self.sensor.calibrated_reading(self.config.reading_samples);
                Response::value(value)
            }
            Err(status) => Response::empty(status),
        }
    }

    /// Boot-time tare, honoured once
    fn calibrate(&mut self) {
        if self.calibrated {
            #[cfg(feature = "esp32-log")]
            println!("[ScaleService] already calibrated, ignoring trigger");
            return;
        }

        #[cfg(feature = "esp32-log")]
        println!("[ScaleService] calibrating");

        self.indicator.set_color(IndicatorState::Calibrating.color());
        self.sensor.tare(self.config.tare_samples);
        self.indicator.set_color(IndicatorState::Idle.color());
        self.calibrated = true;

        #[cfg(feature = "esp32-log")]
        println!("[ScaleService] scale tared");
    }

    pub const fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    pub const fn is_serving(&self) -> bool {
        self.router.is_running()
    }

    pub fn router(&self) -> &Router<ROUTE_CAPACITY> {
        &self.router
    }

    /// Mutable routing table, e.g. to expose the reading under another URI
    pub fn router_mut(&mut self) -> &mut Router<ROUTE_CAPACITY> {
        &mut self.router
    }

    pub fn sensor(&self) -> &W {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut W {
        &mut self.sensor
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }
}
