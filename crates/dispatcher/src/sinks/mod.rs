//! Sink implementations
//!
//! One variant per output protocol: HTTP(S), file, TCP and UDP.

mod file;
mod http;
mod tcp;
mod udp;

pub use self::file::{FileSink, RecordContext};
pub use self::http::HttpSink;
pub use self::tcp::TcpSink;
pub use self::udp::UdpSink;

use contracts::{ContractError, OutputSink};

/// The sink a route delivers to
pub enum RouteSink {
    Http(HttpSink),
    File(FileSink),
    Tcp(TcpSink),
    Udp(UdpSink),
}

impl OutputSink for RouteSink {
    fn name(&self) -> &str {
        match self {
            Self::Http(sink) => sink.name(),
            Self::File(sink) => sink.name(),
            Self::Tcp(sink) => sink.name(),
            Self::Udp(sink) => sink.name(),
        }
    }

    async fn deliver(&self, payload: &[u8]) -> Result<(), ContractError> {
        match self {
            Self::Http(sink) => sink.deliver(payload).await,
            Self::File(sink) => sink.deliver(payload).await,
            Self::Tcp(sink) => sink.deliver(payload).await,
            Self::Udp(sink) => sink.deliver(payload).await,
        }
    }
}
