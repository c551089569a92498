//! URI registrar for the local web API
//!
//! The HTTP transport belongs to the platform. This module only keeps the
//! table of exposed URIs, tracks whether the server should be listening,
//! and resolves incoming requests to an [`Endpoint`] the service can answer.

use core::fmt::Write;

use heapless::{String, Vec};

/// Capacity of a response body
pub const BODY_SIZE: usize = 64;

pub const CONTENT_TYPE_TEXT: &str = "text/plain";
pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Response status codes the scale produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Status {
    Ok = 200,
    NotFound = 404,
    MethodNotAllowed = 405,
    ServiceUnavailable = 503,
}

impl Status {
    pub const fn code(self) -> u16 {
        self as u16
    }
}

/// What a registered URI serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Plain text greeting
    Index,
    /// Liveness probe
    Health,
    /// Calibrated weight reading
    Scale,
}

/// One row of the routing table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub uri: &'static str,
    pub method: Method,
    pub endpoint: Endpoint,
}

/// Returned when registering into a full routing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteTableFull(pub Route);

/// Response handed back to the platform transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub content_type: &'static str,
    pub body: String<BODY_SIZE>,
}

impl Response {
    /// Build a `200` response, truncating bodies longer than [`BODY_SIZE`]
    pub fn ok(content_type: &'static str, body: &str) -> Self {
        let mut response = Self::empty(Status::Ok);
        response.content_type = content_type;
        for c in body.chars() {
            if response.body.push(c).is_err() {
                break;
            }
        }
        response
    }

    /// JSON object with a single numeric `value` field, six fractional digits.
    ///
    /// JSON has no NaN or infinity, those are written as `null`.
    pub fn value(value: f32) -> Self {
        let mut response = Self::empty(Status::Ok);
        response.content_type = CONTENT_TYPE_JSON;
        // Longest f32 with six decimals is well below BODY_SIZE
        let _ = if value.is_finite() {
            write!(response.body, "{{\"value\": {value:.6}}}")
        } else {
            write!(response.body, "{{\"value\": null}}")
        };
        response
    }

    /// Bodyless response with the given status
    pub fn empty(status: Status) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_TEXT,
            body: String::new(),
        }
    }
}

/// Fixed-capacity routing table with a listening flag
///
/// N is the number of routes that can be registered
#[derive(Debug, Default)]
pub struct Router<const N: usize> {
    routes: Vec<Route, N>,
    running: bool,
}

impl<const N: usize> Router<N> {
    pub const fn new() -> Self {
        Self {
            routes: Vec::new(),
            running: false,
        }
    }

    /// Expose `uri`. Registering a known URI replaces its previous route.
    pub fn register(
        &mut self,
        uri: &'static str,
        method: Method,
        endpoint: Endpoint,
    ) -> Result<&mut Self, RouteTableFull> {
        let route = Route {
            uri,
            method,
            endpoint,
        };
        if let Some(existing) = self.routes.iter_mut().find(|r| r.uri == uri) {
            *existing = route;
        } else {
            self.routes.push(route).map_err(RouteTableFull)?;
        }
        Ok(self)
    }

    /// Registered routes, in registration order
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Start listening. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        let changed = !self.running;
        self.running = true;
        changed
    }

    /// Stop listening. Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        let changed = self.running;
        self.running = false;
        changed
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Find the endpoint serving a request.
    ///
    /// The query string is ignored.
    pub fn resolve(&self, method: Method, uri: &str) -> Result<Endpoint, Status> {
        if !self.running {
            return Err(Status::ServiceUnavailable);
        }
        let path = uri.split('?').next().unwrap_or(uri);
        let route = self
            .routes
            .iter()
            .find(|r| r.uri == path)
            .ok_or(Status::NotFound)?;
        if route.method != method {
            return Err(Status::MethodNotAllowed);
        }
        Ok(route.endpoint)
    }
}
