//! Per-route counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use observability::{
    record_bytes_received, record_connection_opened, record_delivery_latency_ms,
    record_message_dispatched, record_message_dropped, record_message_received, RunningStats,
    StatsSummary,
};

/// Why a message never reached its sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Decompress,
    Incomplete,
    Transform,
    Delivery,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decompress => "decompress",
            Self::Incomplete => "incomplete",
            Self::Transform => "transform",
            Self::Delivery => "delivery",
        }
    }
}

/// Counters for one route, mirrored to the metrics recorder
#[derive(Debug)]
pub struct RouteMetrics {
    route: String,
    connections: AtomicU64,
    received: AtomicU64,
    dispatched: AtomicU64,
    dropped: AtomicU64,
    bytes_received: AtomicU64,
    delivery_latency: Mutex<RunningStats>,
}

impl RouteMetrics {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            connections: AtomicU64::new(0),
            received: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            delivery_latency: Mutex::new(RunningStats::default()),
        }
    }

    pub fn inc_connections(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
        record_connection_opened(&self.route);
    }

    pub fn add_bytes(&self, bytes: usize) {
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
        record_bytes_received(&self.route, bytes);
    }

    pub fn inc_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
        record_message_received(&self.route);
    }

    pub fn inc_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        record_message_dispatched(&self.route);
    }

    pub fn inc_dropped(&self, reason: DropReason) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        record_message_dropped(&self.route, reason.as_str());
    }

    pub fn observe_delivery(&self, elapsed: Duration) {
        let latency_ms = elapsed.as_secs_f64() * 1000.0;
        record_delivery_latency_ms(&self.route, latency_ms);
        self.delivery_latency
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(latency_ms);
    }

    pub fn snapshot(&self) -> RouteSnapshot {
        let latency = self
            .delivery_latency
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        RouteSnapshot {
            connections: self.connections.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            delivery_latency_ms: StatsSummary::from(&*latency),
        }
    }
}

/// Point-in-time copy of a route's counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteSnapshot {
    /// TCP connections accepted
    pub connections: u64,
    /// Complete messages handed to the pipeline
    pub received: u64,
    /// Messages accepted by the sink
    pub dispatched: u64,
    pub dropped: u64,
    pub bytes_received: u64,
    pub delivery_latency_ms: StatsSummary,
}
