//! # Ingestion
//!
//! Listener Manager: owns every inbound socket and feeds complete messages
//! through framing, transformation and dispatch.
//!
//! - HTTP: one message per `POST` body, routes on a shared port split by path
//! - TCP: per-connection accumulation until the framer reports completion
//! - UDP: one message per datagram
//!
//! # Example
//!
//! ```no_run
//! use ingestion::Gateway;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo(config: contracts::GatewayConfig) -> Result<(), ingestion::IngestionError> {
//! let token = CancellationToken::new();
//! let gateway = Gateway::bind(&config, token.clone()).await?;
//! let stats = gateway.run().await;
//! println!("received {}", stats.total_received());
//! # Ok(())
//! # }
//! ```

mod error;
mod gateway;
mod listeners;
mod metrics;
mod pipeline;

pub use error::{IngestionError, Result};
pub use gateway::{Gateway, GatewayStats, RouteStats};
pub use listeners::{HTTP_BODY_LIMIT, TCP_READ_CHUNK_SIZE, UDP_RECV_BUFFER_SIZE};
pub use metrics::{DropReason, RouteMetrics, RouteSnapshot};
pub use pipeline::{Outcome, RoutePipeline};
