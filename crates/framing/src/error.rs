//! Framing error types

use thiserror::Error;

/// Framing errors
#[derive(Debug, Error)]
pub enum FramingError {
    /// Payload is not a valid gzip stream
    #[error("gzip decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    /// Gzip encoding failed
    #[error("gzip compression failed: {0}")]
    Compress(#[source] std::io::Error),
}
