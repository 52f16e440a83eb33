//! Dispatcher - delivers a route's payloads to its single sink

use std::sync::Arc;

use contracts::{OutputProtocol, OutputSink, Route};
use tracing::{debug, error, instrument};

use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::sinks::{FileSink, HttpSink, RecordContext, RouteSink, TcpSink, UdpSink};

/// Create the sink selected by the route's output protocol
#[instrument(
    name = "dispatcher_create_sink",
    skip(route),
    fields(route = %route.name, sink_type = %route.output.protocol)
)]
fn create_sink(route: &Route) -> Result<RouteSink, DispatcherError> {
    let output = &route.output;
    let name = format!("{}-{}", route.name, output.protocol);

    let sink = match output.protocol {
        OutputProtocol::Http | OutputProtocol::Https => RouteSink::Http(
            HttpSink::new(&name, output)
                .map_err(|e| DispatcherError::sink_creation(&name, e.to_string()))?,
        ),
        OutputProtocol::File => RouteSink::File(FileSink::new(
            &name,
            &output.file_pattern,
            RecordContext::from_route(route),
        )),
        OutputProtocol::Tcp => RouteSink::Tcp(TcpSink::new(&name, output)),
        OutputProtocol::Udp => RouteSink::Udp(UdpSink::new(&name, output)),
    };

    debug!(sink = %name, "Sink created");
    Ok(sink)
}

/// Delivers transformed payloads for one route
///
/// Delivery is best-effort: failures are logged and counted, never retried
/// and never reported back to the inbound side.
pub struct Dispatcher {
    sink: RouteSink,
    metrics: Arc<SinkMetrics>,
}

impl Dispatcher {
    /// Build the dispatcher for a route
    pub fn from_route(route: &Route) -> Result<Self, DispatcherError> {
        Ok(Self::with_sink(create_sink(route)?))
    }

    /// Create a dispatcher around an existing sink (for testing)
    pub fn with_sink(sink: RouteSink) -> Self {
        Self {
            sink,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Sink name
    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    /// Get current metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Deliver one payload; returns whether the sink accepted it
    pub async fn dispatch(&self, payload: &[u8]) -> bool {
        match self.sink.deliver(payload).await {
            Ok(()) => {
                self.metrics.inc_delivered_count();
                true
            }
            Err(e) => {
                self.metrics.inc_failure_count();
                error!(
                    sink = %self.sink.name(),
                    bytes = payload.len(),
                    error = %e,
                    "Delivery failed, message dropped"
                );
                false
            }
        }
    }
}
