//! # Contracts
//!
//! Frozen interface contracts shared by every gateway crate: the route data
//! model loaded from configuration, the unified error type, and the
//! `OutputSink` trait implemented by the dispatcher's sinks.
//! All business crates depend on this crate; reverse dependencies are prohibited.
//!
//! ## Ownership model
//! - A [`Route`] is created once at startup and never mutated afterwards
//! - Workers share a route read-only behind an `Arc`

mod error;
mod output;
mod route;
mod sink;
mod transform;

pub use error::*;
pub use output::*;
pub use route::*;
pub use sink::*;
pub use transform::*;
