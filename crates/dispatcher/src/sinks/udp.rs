//! UdpSink - one datagram per message, fire-and-forget

use contracts::{ContractError, Output, OutputSink};
use tokio::net::UdpSocket;
use tracing::{debug, instrument, warn};

/// Largest UDP payload over IPv4
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Sink that sends each payload as a single datagram
pub struct UdpSink {
    name: String,
    target: String,
}

impl UdpSink {
    /// Create a new UdpSink; a socket is opened per delivery
    pub fn new(name: impl Into<String>, output: &Output) -> Self {
        Self {
            name: name.into(),
            target: output.authority(),
        }
    }
}

impl OutputSink for UdpSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "udp_sink_deliver",
        skip(self, payload),
        fields(sink = %self.name, target = %self.target, bytes = payload.len())
    )]
    async fn deliver(&self, payload: &[u8]) -> Result<(), ContractError> {
        if payload.len() > MAX_DATAGRAM_SIZE {
            warn!(
                sink = %self.name,
                size = payload.len(),
                max = MAX_DATAGRAM_SIZE,
                "Payload exceeds datagram size"
            );
        }

        // Bind to any available port
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| ContractError::sink_connection(&self.name, e.to_string()))?;
        let sent = socket
            .send_to(payload, self.target.as_str())
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        debug!(sink = %self.name, bytes = sent, "Sent");
        Ok(())
    }
}
