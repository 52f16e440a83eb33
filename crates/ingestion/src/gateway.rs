//! Gateway - binds every route's listener and runs them to shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use contracts::{GatewayConfig, InboundProtocol, Route};
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, instrument};

use crate::error::{IngestionError, Result};
use crate::listeners::{add_route, serve_http, serve_tcp, serve_udp};
use crate::metrics::RouteSnapshot;
use crate::pipeline::RoutePipeline;

/// A bound socket waiting to be served
enum BoundListener {
    Http {
        listener: TcpListener,
        router: Router,
        pipelines: Vec<Arc<RoutePipeline>>,
    },
    Tcp {
        listener: TcpListener,
        pipeline: Arc<RoutePipeline>,
    },
    Udp {
        socket: UdpSocket,
        pipeline: Arc<RoutePipeline>,
    },
}

/// Counters for one route at shutdown
#[derive(Debug, Clone)]
pub struct RouteStats {
    pub name: String,
    pub protocol: InboundProtocol,
    pub port: u16,
    pub sink: String,
    pub counters: RouteSnapshot,
}

/// Statistics from a gateway run
#[derive(Debug, Clone, Default)]
pub struct GatewayStats {
    pub routes: Vec<RouteStats>,
    pub duration: Duration,
}

impl GatewayStats {
    pub fn total_received(&self) -> u64 {
        self.routes.iter().map(|r| r.counters.received).sum()
    }

    pub fn total_dispatched(&self) -> u64 {
        self.routes.iter().map(|r| r.counters.dispatched).sum()
    }

    pub fn total_dropped(&self) -> u64 {
        self.routes.iter().map(|r| r.counters.dropped).sum()
    }

    pub fn route(&self, name: &str) -> Option<&RouteStats> {
        self.routes.iter().find(|r| r.name == name)
    }
}

/// Running set of listeners for a configuration
///
/// [`Gateway::bind`] opens every socket up front; [`Gateway::run`] serves
/// them until the shutdown token is cancelled and in-flight work drains.
pub struct Gateway {
    listeners: Vec<BoundListener>,
    pipelines: Vec<Arc<RoutePipeline>>,
    addrs: Vec<(String, SocketAddr)>,
    token: CancellationToken,
    tracker: TaskTracker,
}

impl Gateway {
    /// Build every route pipeline and bind every listener
    ///
    /// Fails on the first sink that cannot be built, base path that cannot be
    /// routed or socket that cannot be bound; nothing is served in that case.
    #[instrument(name = "gateway_bind", skip(config, token), fields(routes = config.routes.len()))]
    pub async fn bind(config: &GatewayConfig, token: CancellationToken) -> Result<Self> {
        let mut pipelines = Vec::with_capacity(config.routes.len());
        for route in &config.routes {
            pipelines.push(Arc::new(RoutePipeline::new(route.clone())?));
        }
        Self::bind_pipelines(pipelines, token).await
    }

    /// Bind listeners for pre-built pipelines
    pub async fn bind_pipelines(
        pipelines: Vec<Arc<RoutePipeline>>,
        token: CancellationToken,
    ) -> Result<Self> {
        let mut listeners = Vec::new();
        let mut addrs = Vec::new();
        // port -> index into `listeners`
        let mut http_ports: Vec<(u16, usize)> = Vec::new();

        for pipeline in &pipelines {
            let route = pipeline.route();
            match route.protocol {
                InboundProtocol::Http => {
                    // Ephemeral ports are never shared
                    let shared = (route.port != 0)
                        .then(|| http_ports.iter().find(|(port, _)| *port == route.port))
                        .flatten()
                        .map(|(_, idx)| *idx);

                    if let Some(idx) = shared {
                        if let BoundListener::Http {
                            listener,
                            router,
                            pipelines: shared,
                        } = &mut listeners[idx]
                        {
                            *router = add_route(router.clone(), pipeline)?;
                            addrs.push((route.name.clone(), local_addr(route, listener.local_addr())?));
                            shared.push(Arc::clone(pipeline));
                        }
                        continue;
                    }

                    let router = add_route(Router::new(), pipeline)?;
                    let listener = bind_tcp(route).await?;
                    addrs.push((route.name.clone(), local_addr(route, listener.local_addr())?));
                    http_ports.push((route.port, listeners.len()));
                    listeners.push(BoundListener::Http {
                        listener,
                        router,
                        pipelines: vec![Arc::clone(pipeline)],
                    });
                }
                InboundProtocol::Tcp => {
                    let listener = bind_tcp(route).await?;
                    addrs.push((route.name.clone(), local_addr(route, listener.local_addr())?));
                    listeners.push(BoundListener::Tcp {
                        listener,
                        pipeline: Arc::clone(pipeline),
                    });
                }
                InboundProtocol::Udp => {
                    let socket = UdpSocket::bind(route.bind_addr())
                        .await
                        .map_err(|source| bind_error(route, source))?;
                    addrs.push((route.name.clone(), local_addr(route, socket.local_addr())?));
                    listeners.push(BoundListener::Udp {
                        socket,
                        pipeline: Arc::clone(pipeline),
                    });
                }
            }
        }

        for (name, addr) in &addrs {
            info!(route = %name, %addr, "Listener bound");
        }

        Ok(Self {
            listeners,
            pipelines,
            addrs,
            token,
            tracker: TaskTracker::new(),
        })
    }

    /// Address a route's listener is bound to
    pub fn local_addr(&self, route: &str) -> Option<SocketAddr> {
        self.addrs
            .iter()
            .find(|(name, _)| name == route)
            .map(|(_, addr)| *addr)
    }

    /// Token that stops the gateway when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Current counters for every route
    pub fn stats(&self) -> Vec<RouteStats> {
        route_stats(&self.pipelines)
    }

    /// Serve until cancelled, then wait for in-flight workers
    pub async fn run(self) -> GatewayStats {
        let started = Instant::now();
        let mut servers = JoinSet::new();

        for listener in self.listeners {
            let token = self.token.clone();
            let tracker = self.tracker.clone();
            match listener {
                BoundListener::Http {
                    listener,
                    router,
                    pipelines,
                } => {
                    servers.spawn(serve_http(listener, router, pipelines, token));
                }
                BoundListener::Tcp { listener, pipeline } => {
                    servers.spawn(serve_tcp(listener, pipeline, token, tracker));
                }
                BoundListener::Udp { socket, pipeline } => {
                    servers.spawn(serve_udp(socket, pipeline, token, tracker));
                }
            }
        }
        info!(listeners = servers.len(), "Gateway running");

        while let Some(joined) = servers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Listener task failed");
            }
        }

        self.tracker.close();
        self.tracker.wait().await;
        info!("Gateway stopped");

        GatewayStats {
            routes: route_stats(&self.pipelines),
            duration: started.elapsed(),
        }
    }
}

fn route_stats(pipelines: &[Arc<RoutePipeline>]) -> Vec<RouteStats> {
    pipelines
        .iter()
        .map(|pipeline| {
            let route = pipeline.route();
            RouteStats {
                name: route.name.clone(),
                protocol: route.protocol,
                port: route.port,
                sink: route.output.protocol.to_string(),
                counters: pipeline.snapshot(),
            }
        })
        .collect()
}

async fn bind_tcp(route: &Route) -> Result<TcpListener> {
    TcpListener::bind(route.bind_addr())
        .await
        .map_err(|source| bind_error(route, source))
}

fn local_addr(route: &Route, addr: std::io::Result<SocketAddr>) -> Result<SocketAddr> {
    addr.map_err(|source| bind_error(route, source))
}

fn bind_error(route: &Route, source: std::io::Error) -> IngestionError {
    IngestionError::Bind {
        route: route.name.clone(),
        protocol: route.protocol.as_str(),
        addr: route.bind_addr(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContentKind, EntryConfig, Output, OutputProtocol, Transform};
    use tempfile::tempdir;

    fn route(name: &str, protocol: InboundProtocol, port: u16, pattern: &str) -> Route {
        Route {
            protocol,
            port,
            name: name.into(),
            entry: EntryConfig {
                base_path: format!("/{name}"),
                content_type: ContentKind::Json,
                compressed: false,
            },
            transform: Transform::default(),
            output: Output {
                protocol: OutputProtocol::File,
                host: String::new(),
                port: 0,
                path: String::new(),
                timeout: 30,
                headers: Default::default(),
                file_pattern: pattern.into(),
            },
        }
    }

    #[tokio::test]
    async fn test_bind_conflict_is_fatal() {
        let taken = TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let config = GatewayConfig {
            routes: vec![route("busy", InboundProtocol::Tcp, port, "out.log")],
        };
        let err = Gateway::bind(&config, CancellationToken::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IngestionError::Bind { ref route, .. } if route == "busy"));
    }

    #[tokio::test]
    async fn test_http_routes_share_port() {
        let port = free_port().await;
        let config = GatewayConfig {
            routes: vec![
                route("logs", InboundProtocol::Http, port, "a.log"),
                route("events", InboundProtocol::Http, port, "b.log"),
            ],
        };
        let gateway = Gateway::bind(&config, CancellationToken::new()).await.unwrap();

        assert_eq!(gateway.listeners.len(), 1);
        assert_eq!(gateway.local_addr("logs"), gateway.local_addr("events"));
        assert!(gateway.local_addr("missing").is_none());
    }

    async fn free_port() -> u16 {
        let listener = TcpListener::bind("0.0.0.0:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_conflicting_captures_fail_bind() {
        let port = free_port().await;
        let mut first = route("x", InboundProtocol::Http, port, "a.log");
        first.entry.base_path = "/:x".into();
        let mut second = route("y", InboundProtocol::Http, port, "b.log");
        second.entry.base_path = "/:y".into();

        let config = GatewayConfig {
            routes: vec![first, second],
        };
        let err = Gateway::bind(&config, CancellationToken::new())
            .await
            .err()
            .unwrap();
        assert!(
            matches!(err, IngestionError::Route { ref route, ref base_path, .. } if route == "y" && base_path == "/:y"),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn test_unnamed_wildcard_fails_bind() {
        let mut r = route("logs", InboundProtocol::Http, 0, "a.log");
        r.entry.base_path = "/logs/*".into();

        let config = GatewayConfig { routes: vec![r] };
        let err = Gateway::bind(&config, CancellationToken::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IngestionError::Route { ref route, .. } if route == "logs"), "got: {err}");
    }

    #[tokio::test]
    async fn test_run_returns_after_cancel() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("out.log").to_string_lossy().into_owned();
        let config = GatewayConfig {
            routes: vec![
                route("t", InboundProtocol::Tcp, 0, &pattern),
                route("u", InboundProtocol::Udp, 0, &pattern),
                route("h", InboundProtocol::Http, 0, &pattern),
            ],
        };
        let token = CancellationToken::new();
        let gateway = Gateway::bind(&config, token.clone()).await.unwrap();
        assert_eq!(gateway.stats().len(), 3);

        let handle = tokio::spawn(gateway.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        let stats = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.routes.len(), 3);
        assert_eq!(stats.total_received(), 0);
    }
}
