//! UDP listener - one message per datagram

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, trace, warn};

use super::UDP_RECV_BUFFER_SIZE;
use crate::pipeline::RoutePipeline;

/// Receive datagrams until cancelled, one worker per datagram
pub(crate) async fn serve_udp(
    socket: UdpSocket,
    pipeline: Arc<RoutePipeline>,
    token: CancellationToken,
    tracker: TaskTracker,
) {
    info!(route = %pipeline.name(), "UDP listener started");
    let mut buf = vec![0u8; UDP_RECV_BUFFER_SIZE];

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok((n, peer)) => {
                    trace!(route = %pipeline.name(), %peer, bytes = n, "Datagram received");
                    let datagram = Bytes::copy_from_slice(&buf[..n]);
                    tracker.spawn(handle_datagram(Arc::clone(&pipeline), datagram, peer));
                }
                Err(e) => {
                    warn!(route = %pipeline.name(), error = %e, "Receive failed");
                }
            }
        }
    }

    info!(route = %pipeline.name(), "UDP listener stopped");
}

async fn handle_datagram(pipeline: Arc<RoutePipeline>, datagram: Bytes, peer: SocketAddr) {
    pipeline.process_unit(&datagram, &peer.to_string()).await;
}
