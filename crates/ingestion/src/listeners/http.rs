//! HTTP listener - one message per request body
//!
//! Routes sharing a port are served by one server and told apart by base
//! path.

use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, FailedToBufferBody};
use axum::extract::{ConnectInfo, DefaultBodyLimit, State};
use axum::http::{Method, StatusCode};
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::HTTP_BODY_LIMIT;
use crate::error::{IngestionError, Result};
use crate::metrics::DropReason;
use crate::pipeline::{Outcome, RoutePipeline};

/// Response sent for each request outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HttpOutcome {
    Accepted,
    MethodNotAllowed,
    TooLarge,
    Incomplete,
    Failed,
}

impl HttpOutcome {
    fn from_outcome(outcome: Outcome) -> Self {
        match outcome {
            // Delivery is best-effort and never reported to the client
            Outcome::Delivered | Outcome::Empty | Outcome::Dropped(DropReason::Delivery) => {
                Self::Accepted
            }
            Outcome::Dropped(DropReason::Incomplete) => Self::Incomplete,
            Outcome::Dropped(DropReason::Decompress | DropReason::Transform) => Self::Failed,
        }
    }

    fn response(self) -> (StatusCode, &'static str) {
        match self {
            Self::Accepted => (StatusCode::OK, "accepted"),
            Self::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "method not allowed"),
            Self::TooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "message too large"),
            Self::Incomplete => (StatusCode::BAD_REQUEST, "incomplete message"),
            Self::Failed => (StatusCode::INTERNAL_SERVER_ERROR, "failed to process message"),
        }
    }
}

/// Add one route's base path to a port's router
///
/// The router panics on paths its matcher cannot insert (conflicting
/// captures, unnamed wildcards); that is turned into a startup error.
pub(crate) fn add_route(router: Router, pipeline: &Arc<RoutePipeline>) -> Result<Router> {
    let base_path = &pipeline.route().entry.base_path;
    let handler = any(handle_request).with_state(Arc::clone(pipeline));

    catch_unwind(AssertUnwindSafe(|| router.route(base_path, handler))).map_err(|panic| {
        let message = panic
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
            .unwrap_or_else(|| "invalid route".to_string());
        IngestionError::Route {
            route: pipeline.name().to_string(),
            base_path: base_path.clone(),
            message,
        }
    })
}

async fn handle_request(
    State(pipeline): State<Arc<RoutePipeline>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    body: std::result::Result<Bytes, BytesRejection>,
) -> (StatusCode, &'static str) {
    if method != Method::POST {
        warn!(route = %pipeline.name(), %peer, %method, "Method not allowed");
        return HttpOutcome::MethodNotAllowed.response();
    }

    let body = match body {
        Ok(body) => body,
        Err(BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(e))) => {
            warn!(
                route = %pipeline.name(),
                %peer,
                error = %e,
                limit = HTTP_BODY_LIMIT,
                "Request body too large"
            );
            return HttpOutcome::TooLarge.response();
        }
        Err(e) => {
            warn!(route = %pipeline.name(), %peer, error = %e, "Failed to read request body");
            return HttpOutcome::Incomplete.response();
        }
    };

    let outcome = pipeline.process_unit(&body, &peer.to_string()).await;
    HttpOutcome::from_outcome(outcome).response()
}

/// Serve all routes of one port until cancelled
pub(crate) async fn serve_http(
    listener: TcpListener,
    router: Router,
    pipelines: Vec<Arc<RoutePipeline>>,
    token: CancellationToken,
) {
    let routes = pipelines
        .iter()
        .map(|p| p.name())
        .collect::<Vec<_>>()
        .join(",");
    info!(routes = %routes, "HTTP listener started");

    let app = router
        .layer(DefaultBodyLimit::max(HTTP_BODY_LIMIT))
        .into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(token.cancelled_owned())
        .await
    {
        error!(routes = %routes, error = %e, "HTTP server failed");
    }

    info!(routes = %routes, "HTTP listener stopped");
}
