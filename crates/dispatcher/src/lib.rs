//! # Dispatcher
//!
//! Outbound delivery module.
//!
//! Responsibilities:
//! - Build exactly one sink per route from its `Output` descriptor
//! - Deliver each transformed payload to that sink
//! - Log delivery failures and drop the message (no retry)

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod sinks;

pub use contracts::OutputSink;
pub use dispatcher::Dispatcher;
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, HttpSink, RecordContext, RouteSink, TcpSink, UdpSink};
