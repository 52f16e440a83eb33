//! Gateway metrics
//!
//! Counters are labelled by route name. Without an installed recorder every
//! call is a no-op.

use metrics::{counter, histogram};

/// A complete message entered a route's pipeline
pub fn record_message_received(route: &str) {
    counter!("protogate_messages_received_total", "route" => route.to_string()).increment(1);
}

/// A message was accepted by the route's sink
pub fn record_message_dispatched(route: &str) {
    counter!("protogate_messages_dispatched_total", "route" => route.to_string()).increment(1);
}

/// A message was discarded; `reason` names the failing stage
pub fn record_message_dropped(route: &str, reason: &str) {
    counter!(
        "protogate_messages_dropped_total",
        "route" => route.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Raw bytes read from the inbound transport
pub fn record_bytes_received(route: &str, bytes: usize) {
    counter!("protogate_bytes_received_total", "route" => route.to_string())
        .increment(bytes as u64);
}

/// A TCP client connected
pub fn record_connection_opened(route: &str) {
    counter!("protogate_connections_total", "route" => route.to_string()).increment(1);
}

/// Time spent in one sink delivery
pub fn record_delivery_latency_ms(route: &str, latency_ms: f64) {
    histogram!("protogate_delivery_latency_ms", "route" => route.to_string()).record(latency_ms);
}

/// Statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
