//! # Framing
//!
//! Message-boundary detection and envelope handling for inbound bytes.
//!
//! Responsibilities:
//! - Decide whether accumulated bytes form one complete message ([`is_complete`])
//! - Reverse the optional gzip envelope ([`decompress`])
//! - Normalise raw reads before accumulation ([`normalize_chunk`])
//!
//! Everything here is pure: no I/O, no shared state.

mod chunk;
mod decompress;
mod error;
mod framer;

pub use chunk::normalize_chunk;
pub use decompress::{compress, decode_envelope, decompress};
pub use error::FramingError;
pub use framer::is_complete;
