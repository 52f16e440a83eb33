//! Transport listeners
//!
//! Each listener owns one bound socket and runs until the shutdown token is
//! cancelled. Per-message work is handed to [`RoutePipeline`](crate::RoutePipeline).

mod http;
mod tcp;
mod udp;

pub(crate) use http::{add_route, serve_http};
pub(crate) use tcp::serve_tcp;
pub(crate) use udp::serve_udp;

/// Read size for TCP connections
pub const TCP_READ_CHUNK_SIZE: usize = 64 * 1024;

/// Receive buffer for UDP datagrams
pub const UDP_RECV_BUFFER_SIZE: usize = 65_536;

/// Largest HTTP request body read into one message
pub const HTTP_BODY_LIMIT: usize = 2 * 1024 * 1024;
