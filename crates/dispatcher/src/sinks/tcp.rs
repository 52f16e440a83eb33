//! TcpSink - transient connection per message, fire-and-forget

use contracts::{ContractError, Output, OutputSink};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, instrument};

/// Sink that opens a connection, writes the payload and closes
pub struct TcpSink {
    name: String,
    target: String,
    timeout: Option<Duration>,
}

impl TcpSink {
    /// Create a new TcpSink; no connection is made until delivery
    pub fn new(name: impl Into<String>, output: &Output) -> Self {
        Self {
            name: name.into(),
            target: output.authority(),
            timeout: output.timeout(),
        }
    }

    async fn send(&self, payload: &[u8]) -> Result<(), ContractError> {
        let mut stream = TcpStream::connect(self.target.as_str())
            .await
            .map_err(|e| ContractError::sink_connection(&self.name, e.to_string()))?;
        stream
            .write_all(payload)
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        stream
            .shutdown()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }
}

impl OutputSink for TcpSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "tcp_sink_deliver",
        skip(self, payload),
        fields(sink = %self.name, target = %self.target, bytes = payload.len())
    )]
    async fn deliver(&self, payload: &[u8]) -> Result<(), ContractError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.send(payload))
                .await
                .map_err(|_| {
                    ContractError::sink_connection(&self.name, format!("timed out after {limit:?}"))
                })??,
            None => self.send(payload).await?,
        }

        debug!(sink = %self.name, bytes = payload.len(), "Sent");
        Ok(())
    }
}
