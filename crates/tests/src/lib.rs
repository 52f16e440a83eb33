//! # Integration Tests
//!
//! Cross-crate scenarios driven through real sockets:
//! - configuration documents accepted end to end
//! - TCP, UDP and HTTP inbound into file, HTTP, TCP and UDP sinks
//! - HTTP response codes and graceful shutdown

#[cfg(test)]
mod harness {
    use std::net::{Ipv4Addr, SocketAddr};
    use std::path::Path;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use ingestion::{Gateway, GatewayStats};
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;

    /// A gateway running in the background on ephemeral ports
    pub struct Harness {
        addrs: Vec<(String, SocketAddr)>,
        token: CancellationToken,
        handle: JoinHandle<GatewayStats>,
    }

    impl Harness {
        /// Load and validate `yaml`, then serve every route on an ephemeral port
        pub async fn start(yaml: &str) -> Self {
            let mut config = ConfigLoader::load_from_str(yaml, ConfigFormat::Yaml).unwrap();
            for route in &mut config.routes {
                route.port = 0;
            }

            let token = CancellationToken::new();
            let gateway = Gateway::bind(&config, token.clone()).await.unwrap();
            let addrs = config
                .routes
                .iter()
                .map(|r| {
                    let bound = gateway.local_addr(&r.name).unwrap();
                    (r.name.clone(), SocketAddr::from((Ipv4Addr::LOCALHOST, bound.port())))
                })
                .collect();

            Self {
                addrs,
                token,
                handle: tokio::spawn(gateway.run()),
            }
        }

        pub fn addr(&self, route: &str) -> SocketAddr {
            self.addrs
                .iter()
                .find(|(name, _)| name == route)
                .map(|(_, addr)| *addr)
                .unwrap()
        }

        /// Cancel and wait for the gateway to drain
        pub async fn stop(self) -> GatewayStats {
            self.token.cancel();
            tokio::time::timeout(Duration::from_secs(5), self.handle)
                .await
                .expect("gateway did not stop")
                .unwrap()
        }
    }

    /// Poll `path` until it has at least `count` lines
    pub async fn wait_for_lines(path: &Path, count: usize) -> Vec<String> {
        for _ in 0..250 {
            if let Ok(content) = std::fs::read_to_string(path) {
                let lines: Vec<String> = content.lines().map(str::to_owned).collect();
                if lines.len() >= count {
                    return lines;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("{} never reached {count} lines", path.display());
    }

    /// Payload of a file sink record, unquoted
    pub fn record_payload(line: &str) -> String {
        let (_, quoted) = line.split_once(" payload=").unwrap();
        serde_json::from_str(quoted).unwrap()
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ContentKind, InboundProtocol, OutputProtocol};

    #[test]
    fn test_full_document_loads() {
        let config = ConfigLoader::load_from_str(
            r#"
routes:
  - protocol: http
    port: 8080
    name: web-events
    entry:
      basePath: /events
      content_type: json
      compressed: true
    transform:
      remap:
        - { source: ts, target: timestamp }
        - { source: user, target: user_id, preserve_source: true }
      static_fields: { env: prod }
      remove_fields: [debug]
    output:
      protocol: https
      host: collector.internal
      port: 443
      path: /v1/events
      timeout: 5
      headers: { Authorization: Bearer abc }
  - protocol: udp
    port: 5140
    name: syslog
    entry: { content_type: text }
    output: { protocol: file, file_pattern: "/var/log/gw/syslog-${DATE}.log" }
"#,
            ConfigFormat::Yaml,
        )
        .unwrap();

        let web = &config.routes[0];
        assert_eq!(web.protocol, InboundProtocol::Http);
        assert_eq!(web.entry.content_type, ContentKind::Json);
        assert_eq!(web.transform.remap.len(), 2);
        assert!(web.transform.remap[1].preserve_source);
        assert_eq!(web.output.url(), "https://collector.internal:443/v1/events");

        let syslog = &config.routes[1];
        assert_eq!(syslog.entry.base_path, "/");
        assert_eq!(syslog.output.protocol, OutputProtocol::File);
        assert_eq!(syslog.output.timeout, 30);
    }

    #[test]
    fn test_unknown_protocol_rejected() {
        let result = ConfigLoader::load_from_str(
            r#"
routes:
  - protocol: sctp
    port: 9000
    name: bad
    output: { protocol: file, file_pattern: a.log }
"#,
            ConfigFormat::Yaml,
        );
        assert!(result.is_err());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::body::Bytes;
    use axum::routing::post;
    use axum::Router;
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream, UdpSocket};
    use tokio::sync::mpsc;

    use crate::harness::{record_payload, wait_for_lines, Harness};

    /// HTTP receiver that forwards every body to a channel
    async fn spawn_http_receiver() -> (SocketAddr, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Router::new().route(
            "/ingest",
            post(move |body: Bytes| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(body);
                    "ok"
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, rx)
    }

    async fn recv_within<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("nothing received")
            .unwrap()
    }

    #[tokio::test]
    async fn test_tcp_json_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let gateway = Harness::start(&format!(
            r#"
routes:
  - protocol: tcp
    port: 9000
    name: app-logs
    entry: {{ content_type: json }}
    transform:
      remap: [{{ source: level, target: severity }}]
      static_fields: {{ service: gw }}
    output: {{ protocol: file, file_pattern: "{}" }}
"#,
            path.display()
        ))
        .await;

        // Split across two writes; the connection worker accumulates
        let mut client = TcpStream::connect(gateway.addr("app-logs")).await.unwrap();
        client.write_all(br#"{"level":"info","#).await.unwrap();
        client.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.write_all(br#""msg":"hi"}"#).await.unwrap();

        let lines = wait_for_lines(&path, 1).await;
        assert!(lines[0].contains(" route=app-logs "));
        assert!(lines[0].contains(" protocol=tcp "));
        let payload: Value = serde_json::from_str(&record_payload(&lines[0])).unwrap();
        assert_eq!(payload, json!({"severity": "info", "msg": "hi", "service": "gw"}));

        drop(client);
        let stats = gateway.stop().await;
        let route = stats.route("app-logs").unwrap();
        assert_eq!(route.counters.received, 1);
        assert_eq!(route.counters.dispatched, 1);
        assert_eq!(route.counters.connections, 1);
    }

    #[tokio::test]
    async fn test_tcp_messages_forwarded_to_http_in_order() {
        let (receiver, mut rx) = spawn_http_receiver().await;
        let gateway = Harness::start(&format!(
            r#"
routes:
  - protocol: tcp
    port: 9001
    name: to-http
    entry: {{ content_type: json }}
    transform:
      remove_fields: [secret]
    output:
      protocol: http
      host: 127.0.0.1
      port: {}
      path: /ingest
      timeout: 5
"#,
            receiver.port()
        ))
        .await;

        let mut client = TcpStream::connect(gateway.addr("to-http")).await.unwrap();
        for n in 1..=3 {
            client
                .write_all(format!(r#"{{"n":{n},"secret":"x"}}"#).as_bytes())
                .await
                .unwrap();
            let body = recv_within(&mut rx).await;
            let value: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(value, json!({ "n": n }));
        }

        drop(client);
        assert_eq!(gateway.stop().await.total_dispatched(), 3);
    }

    #[tokio::test]
    async fn test_tcp_text_lines_to_tcp_sink() {
        let sink = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let sink_port = sink.local_addr().unwrap().port();
        let gateway = Harness::start(&format!(
            r#"
routes:
  - protocol: tcp
    port: 9002
    name: lines
    entry: {{ content_type: text }}
    output: {{ protocol: tcp, host: 127.0.0.1, port: {sink_port} }}
"#
        ))
        .await;

        let mut client = TcpStream::connect(gateway.addr("lines")).await.unwrap();
        client.write_all(b"partial-").await.unwrap();
        client.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.write_all(b"line\n").await.unwrap();

        // The sink opens one connection per message and closes it after writing
        let (mut conn, _) = tokio::time::timeout(Duration::from_secs(5), sink.accept())
            .await
            .unwrap()
            .unwrap();
        let mut received = Vec::new();
        conn.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"partial-line\n");

        drop(client);
        gateway.stop().await;
    }

    #[tokio::test]
    async fn test_tcp_text_terminator_in_own_read() {
        let sink = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let sink_port = sink.local_addr().unwrap().port();
        let gateway = Harness::start(&format!(
            r#"
routes:
  - protocol: tcp
    port: 9010
    name: split-lines
    entry: {{ content_type: text }}
    output: {{ protocol: tcp, host: 127.0.0.1, port: {sink_port} }}
"#
        ))
        .await;

        let mut client = TcpStream::connect(gateway.addr("split-lines")).await.unwrap();
        for chunk in [&b"hello"[..], b"\n", b"world\n"] {
            client.write_all(chunk).await.unwrap();
            client.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let mut lines = Vec::new();
        for _ in 0..2 {
            let (mut conn, _) = tokio::time::timeout(Duration::from_secs(5), sink.accept())
                .await
                .unwrap()
                .unwrap();
            let mut received = Vec::new();
            conn.read_to_end(&mut received).await.unwrap();
            lines.push(received);
        }
        assert_eq!(lines, vec![b"hello\n".to_vec(), b"world\n".to_vec()]);

        drop(client);
        let stats = gateway.stop().await;
        assert_eq!(stats.route("split-lines").unwrap().counters.dispatched, 2);
    }

    #[tokio::test]
    async fn test_udp_datagram_to_udp_sink() {
        let sink = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sink_port = sink.local_addr().unwrap().port();
        let gateway = Harness::start(&format!(
            r#"
routes:
  - protocol: udp
    port: 9003
    name: relay
    entry: {{ content_type: json }}
    transform:
      remap: [{{ source: host, target: source_host, preserve_source: true }}]
    output: {{ protocol: udp, host: 127.0.0.1, port: {sink_port} }}
"#
        ))
        .await;

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client
            .send_to(b"{\"host\":\"web-1\"}\n\0", gateway.addr("relay"))
            .await
            .unwrap();

        let mut buf = [0u8; 1024];
        let (n, _) = tokio::time::timeout(Duration::from_secs(5), sink.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let value: Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(value, json!({"host": "web-1", "source_host": "web-1"}));

        gateway.stop().await;
    }

    #[tokio::test]
    async fn test_udp_bad_datagram_does_not_stop_listener() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("udp.log");
        let gateway = Harness::start(&format!(
            r#"
routes:
  - protocol: udp
    port: 9004
    name: udp-json
    entry: {{ content_type: json }}
    output: {{ protocol: file, file_pattern: "{}" }}
"#,
            path.display()
        ))
        .await;

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = gateway.addr("udp-json");
        client.send_to(b"{not json}", target).await.unwrap();
        client.send_to(b"{\"half\":", target).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.send_to(b"{\"ok\":true}", target).await.unwrap();

        let lines = wait_for_lines(&path, 1).await;
        assert_eq!(record_payload(&lines[0]), r#"{"ok":true}"#);

        let stats = gateway.stop().await;
        assert_eq!(stats.total_dispatched(), 1);
        assert_eq!(stats.total_dropped(), 2);
    }

    #[tokio::test]
    async fn test_http_inbound_status_codes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("http.log");
        let gateway = Harness::start(&format!(
            r#"
routes:
  - protocol: http
    port: 8080
    name: events
    entry: {{ basePath: /events, content_type: json }}
    transform:
      static_fields: {{ source: http }}
    output: {{ protocol: file, file_pattern: "{}" }}
"#,
            path.display()
        ))
        .await;

        let client = reqwest::Client::new();
        let url = format!("http://{}/events", gateway.addr("events"));

        let response = client.get(&url).send().await.unwrap();
        assert_eq!(response.status(), 405);
        assert_eq!(response.text().await.unwrap(), "method not allowed");

        let response = client.post(&url).body(r#"{"a":"#).send().await.unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(response.text().await.unwrap(), "incomplete message");

        let response = client.post(&url).body("{broken}").send().await.unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(response.text().await.unwrap(), "failed to process message");

        let oversized = format!(r#"{{"a":"{}"}}"#, "x".repeat(ingestion::HTTP_BODY_LIMIT));
        let response = client.post(&url).body(oversized).send().await.unwrap();
        assert_eq!(response.status(), 413);
        assert_eq!(response.text().await.unwrap(), "message too large");

        let response = client.post(&url).body(r#"{"a":1}"#).send().await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "accepted");

        let lines = wait_for_lines(&path, 1).await;
        let payload: Value = serde_json::from_str(&record_payload(&lines[0])).unwrap();
        assert_eq!(payload, json!({"a": 1, "source": "http"}));
        assert!(lines[0].contains(" protocol=http "));

        let stats = gateway.stop().await;
        let route = stats.route("events").unwrap();
        assert_eq!(route.counters.dispatched, 1);
        assert_eq!(route.counters.dropped, 2);
    }

    #[tokio::test]
    async fn test_http_compressed_body() {
        let (receiver, mut rx) = spawn_http_receiver().await;
        let gateway = Harness::start(&format!(
            r#"
routes:
  - protocol: http
    port: 8081
    name: gz
    entry: {{ basePath: /gz, content_type: json, compressed: true }}
    transform:
      remap: [{{ source: msg, target: message }}]
    output: {{ protocol: http, host: 127.0.0.1, port: {}, path: ingest }}
"#,
            receiver.port()
        ))
        .await;

        let client = reqwest::Client::new();
        let url = format!("http://{}/gz", gateway.addr("gz"));
        let packed = framing::compress(b"{\"msg\":\"zipped\"}\n").unwrap();

        let response = client.post(&url).body(packed).send().await.unwrap();
        assert_eq!(response.status(), 200);
        let body = recv_within(&mut rx).await;
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"message": "zipped"}));

        // Not gzip at all
        let response = client.post(&url).body(r#"{"msg":"plain"}"#).send().await.unwrap();
        assert_eq!(response.status(), 500);

        gateway.stop().await;
    }

    #[tokio::test]
    async fn test_http_delivery_failure_still_accepted() {
        let unused = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_port = unused.local_addr().unwrap().port();
        drop(unused);

        let gateway = Harness::start(&format!(
            r#"
routes:
  - protocol: http
    port: 8082
    name: dead-sink
    entry: {{ content_type: json }}
    output: {{ protocol: http, host: 127.0.0.1, port: {dead_port}, timeout: 2 }}
"#
        ))
        .await;

        let response = reqwest::Client::new()
            .post(format!("http://{}/", gateway.addr("dead-sink")))
            .body(r#"{"a":1}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let stats = gateway.stop().await;
        assert_eq!(stats.route("dead-sink").unwrap().counters.dropped, 1);
    }

    #[tokio::test]
    async fn test_shutdown_with_open_connection() {
        let dir = tempdir().unwrap();
        let gateway = Harness::start(&format!(
            r#"
routes:
  - protocol: tcp
    port: 9005
    name: idle
    output: {{ protocol: file, file_pattern: "{}" }}
"#,
            dir.path().join("idle.log").display()
        ))
        .await;

        let mut client = TcpStream::connect(gateway.addr("idle")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Returns even though the client never disconnects
        let stats = gateway.stop().await;
        assert_eq!(stats.route("idle").unwrap().counters.connections, 1);

        let mut buf = [0u8; 1];
        let read = tokio::time::timeout(Duration::from_secs(5), client.read(&mut buf))
            .await
            .unwrap();
        assert!(matches!(read, Ok(0) | Err(_)));
    }
}
