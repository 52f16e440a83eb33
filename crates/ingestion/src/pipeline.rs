//! RoutePipeline - framing, transform and dispatch for one route
//!
//! Listeners own the transport; everything after the bytes arrive lives here
//! so HTTP, TCP and UDP share one processing path.

use std::time::Instant;

use bytes::Bytes;
use contracts::Route;
use dispatcher::Dispatcher;
use framing::{decode_envelope, is_complete, normalize_chunk, FramingError};
use tracing::{debug, instrument, warn};
use transform::TransformEngine;

use crate::error::{IngestionError, Result};
use crate::metrics::{DropReason, RouteMetrics, RouteSnapshot};

/// What happened to one candidate message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Sink accepted the payload
    Delivered,
    /// Nothing left after normalisation
    Empty,
    /// Dropped before reaching the sink
    Dropped(DropReason),
}

/// Per-route processing state shared by all workers of that route
pub struct RoutePipeline {
    route: Route,
    engine: TransformEngine,
    dispatcher: Dispatcher,
    metrics: RouteMetrics,
}

impl RoutePipeline {
    /// Build the pipeline, including the route's sink
    pub fn new(route: Route) -> Result<Self> {
        let dispatcher =
            Dispatcher::from_route(&route).map_err(|source| IngestionError::Dispatcher {
                route: route.name.clone(),
                source,
            })?;
        Ok(Self::with_dispatcher(route, dispatcher))
    }

    /// Build around an existing dispatcher
    pub fn with_dispatcher(route: Route, dispatcher: Dispatcher) -> Self {
        let engine = TransformEngine::new(route.transform.clone(), route.entry.content_type.clone());
        let metrics = RouteMetrics::new(route.name.clone());
        Self {
            route,
            engine,
            dispatcher,
            metrics,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn name(&self) -> &str {
        &self.route.name
    }

    pub fn metrics(&self) -> &RouteMetrics {
        &self.metrics
    }

    pub fn snapshot(&self) -> RouteSnapshot {
        self.metrics.snapshot()
    }

    /// Reverse the envelope and normalise one raw read
    pub fn prepare(&self, raw: &[u8]) -> std::result::Result<Bytes, FramingError> {
        let decoded = decode_envelope(raw, self.route.entry.compressed)?;
        let normalized = normalize_chunk(&decoded, &self.route.entry.content_type);
        Ok(decoded.slice_ref(normalized))
    }

    /// Whether `buffer` holds one complete message for this route's kind
    pub fn is_complete(&self, buffer: &[u8]) -> bool {
        is_complete(buffer, &self.route.entry.content_type)
    }

    /// Process a self-contained unit (one datagram or one request body)
    ///
    /// The unit is never accumulated: if it does not frame as complete it is
    /// dropped.
    pub async fn process_unit(&self, raw: &[u8], peer: &str) -> Outcome {
        self.metrics.add_bytes(raw.len());

        let message = match self.prepare(raw) {
            Ok(message) => message,
            Err(e) => {
                warn!(route = %self.route.name, peer, error = %e, "Decompression failed, message dropped");
                self.metrics.inc_dropped(DropReason::Decompress);
                return Outcome::Dropped(DropReason::Decompress);
            }
        };

        if !self.is_complete(&message) {
            warn!(
                route = %self.route.name,
                peer,
                bytes = message.len(),
                "Incomplete message dropped"
            );
            self.metrics.inc_dropped(DropReason::Incomplete);
            return Outcome::Dropped(DropReason::Incomplete);
        }

        if message.is_empty() {
            debug!(route = %self.route.name, peer, "Empty message skipped");
            return Outcome::Empty;
        }

        self.process(&message, peer).await
    }

    /// Transform and dispatch one complete message
    #[instrument(
        name = "route_process",
        skip(self, message, peer),
        fields(route = %self.route.name, peer = %peer, bytes = message.len())
    )]
    pub async fn process(&self, message: &[u8], peer: &str) -> Outcome {
        if message.is_empty() {
            return Outcome::Empty;
        }
        self.metrics.inc_received();

        let payload = match self.engine.apply(message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(route = %self.route.name, error = %e, "Transform failed, message dropped");
                self.metrics.inc_dropped(DropReason::Transform);
                return Outcome::Dropped(DropReason::Transform);
            }
        };

        let started = Instant::now();
        let delivered = self.dispatcher.dispatch(&payload).await;
        self.metrics.observe_delivery(started.elapsed());

        if delivered {
            self.metrics.inc_dispatched();
            debug!(sink = %self.dispatcher.sink_name(), "Message dispatched");
            Outcome::Delivered
        } else {
            self.metrics.inc_dropped(DropReason::Delivery);
            Outcome::Dropped(DropReason::Delivery)
        }
    }
}
