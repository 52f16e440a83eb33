//! Ingestion error types

use std::net::SocketAddr;

use thiserror::Error;

/// Ingestion errors
///
/// Every variant is fatal at startup; per-message failures are logged by the
/// workers and never surface as errors.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Listener could not bind its port
    #[error("route '{route}' failed to bind {protocol} listener on {addr}: {source}")]
    Bind {
        /// Route name
        route: String,
        /// Inbound protocol
        protocol: &'static str,
        /// Requested address
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// HTTP base path rejected by the router
    #[error("route '{route}' cannot serve base path '{base_path}': {message}")]
    Route {
        /// Route name
        route: String,
        /// Configured base path
        base_path: String,
        /// Router complaint
        message: String,
    },

    /// Route sink could not be built
    #[error("route '{route}' has an unusable output: {source}")]
    Dispatcher {
        /// Route name
        route: String,
        #[source]
        source: dispatcher::DispatcherError,
    },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
