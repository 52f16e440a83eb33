//! TCP listener - stream accumulation per connection

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::TCP_READ_CHUNK_SIZE;
use crate::pipeline::RoutePipeline;

/// Accept connections until cancelled, one worker per connection
pub(crate) async fn serve_tcp(
    listener: TcpListener,
    pipeline: Arc<RoutePipeline>,
    token: CancellationToken,
    tracker: TaskTracker,
) {
    info!(route = %pipeline.name(), "TCP listener started");

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    info!(route = %pipeline.name(), %peer, "Client connected");
                    pipeline.metrics().inc_connections();
                    tracker.spawn(handle_connection(
                        Arc::clone(&pipeline),
                        stream,
                        peer,
                        token.clone(),
                    ));
                }
                Err(e) => {
                    warn!(route = %pipeline.name(), error = %e, "Accept failed");
                }
            }
        }
    }

    info!(route = %pipeline.name(), "TCP listener stopped");
}

/// Read chunks, accumulate them and emit every completed message
///
/// The buffer is cleared after each completed message; a partial tail left
/// when the peer disconnects is discarded.
async fn handle_connection(
    pipeline: Arc<RoutePipeline>,
    mut stream: TcpStream,
    peer: SocketAddr,
    token: CancellationToken,
) {
    let peer_label = peer.to_string();
    let mut chunk = vec![0u8; TCP_READ_CHUNK_SIZE];
    let mut buffer = BytesMut::new();

    loop {
        let read = tokio::select! {
            _ = token.cancelled() => {
                debug!(route = %pipeline.name(), %peer, "Closing connection for shutdown");
                break;
            }
            read = stream.read(&mut chunk) => read,
        };

        let n = match read {
            Ok(0) => {
                info!(route = %pipeline.name(), %peer, "Client disconnected");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                warn!(route = %pipeline.name(), %peer, error = %e, "Read failed, closing connection");
                break;
            }
        };
        pipeline.metrics().add_bytes(n);

        let data = match pipeline.prepare(&chunk[..n]) {
            Ok(data) => data,
            Err(e) => {
                warn!(route = %pipeline.name(), %peer, error = %e, "Decompression failed, chunk dropped");
                pipeline.metrics().inc_dropped(crate::DropReason::Decompress);
                continue;
            }
        };
        buffer.extend_from_slice(&data);

        if buffer.is_empty() {
            continue;
        }
        if !pipeline.is_complete(&buffer) {
            debug!(
                route = %pipeline.name(),
                %peer,
                buffered = buffer.len(),
                "Incomplete message, waiting for more data"
            );
            continue;
        }

        let message = buffer.split().freeze();
        pipeline.process(&message, &peer_label).await;
    }

    if !buffer.is_empty() {
        debug!(
            route = %pipeline.name(),
            %peer,
            discarded = buffer.len(),
            "Partial message discarded"
        );
    }
}
