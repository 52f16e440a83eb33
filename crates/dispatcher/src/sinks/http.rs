//! HttpSink - synchronous POST per message

use contracts::{ContractError, Output, OutputSink};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

/// Sink that POSTs each payload to an HTTP(S) endpoint
pub struct HttpSink {
    name: String,
    url: String,
    headers: HeaderMap,
    client: Client,
}

impl HttpSink {
    /// Create a new HttpSink
    ///
    /// Fails when a configured header is not a valid HTTP header or the
    /// client cannot be built.
    pub fn new(name: impl Into<String>, output: &Output) -> Result<Self, ContractError> {
        let name = name.into();
        let headers = build_headers(&name, output)?;

        let mut builder = Client::builder();
        if let Some(timeout) = output.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))?;

        Ok(Self {
            name,
            url: output.url(),
            headers,
            client,
        })
    }

    /// Destination URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// `Content-Type: application/json` plus configured overrides
fn build_headers(sink_name: &str, output: &Output) -> Result<HeaderMap, ContractError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (key, value) in &output.headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            ContractError::sink_connection(sink_name, format!("invalid header name '{key}': {e}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ContractError::sink_connection(sink_name, format!("invalid value for header '{key}': {e}"))
        })?;
        headers.insert(name, value);
    }

    Ok(headers)
}

fn is_accepted(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::ACCEPTED
}

impl OutputSink for HttpSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_sink_deliver",
        skip(self, payload),
        fields(sink = %self.name, url = %self.url, bytes = payload.len())
    )]
    async fn deliver(&self, payload: &[u8]) -> Result<(), ContractError> {
        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|e| ContractError::sink_connection(&self.name, e.to_string()))?;

        let status = response.status();
        if !is_accepted(status) {
            return Err(ContractError::SinkStatus {
                sink_name: self.name.clone(),
                status: status.as_u16(),
            });
        }

        debug!(sink = %self.name, status = status.as_u16(), "Delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::HeaderMap as ReceivedHeaders;
    use axum::routing::post;
    use axum::Router;
    use contracts::OutputProtocol;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use tokio::sync::mpsc;

    type Received = (ReceivedHeaders, Bytes);

    /// Start a receiver that answers every POST with `status`
    async fn spawn_receiver(status: StatusCode) -> (SocketAddr, mpsc::UnboundedReceiver<Received>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Router::new().route(
            "/ingest",
            post(move |headers: ReceivedHeaders, body: Bytes| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send((headers, body));
                    axum::http::StatusCode::from_u16(status.as_u16()).unwrap()
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, rx)
    }

    fn output_for(addr: SocketAddr, headers: HashMap<String, String>) -> Output {
        Output {
            protocol: OutputProtocol::Http,
            host: addr.ip().to_string(),
            port: addr.port(),
            path: "/ingest".into(),
            timeout: 5,
            headers,
            file_pattern: String::new(),
        }
    }

    #[tokio::test]
    async fn test_http_sink_success_statuses() {
        for status in [StatusCode::OK, StatusCode::ACCEPTED] {
            let (addr, mut rx) = spawn_receiver(status).await;
            let sink = HttpSink::new("test_http", &output_for(addr, HashMap::new())).unwrap();

            sink.deliver(br#"{"a":1}"#).await.unwrap();

            let (headers, body) = rx.recv().await.unwrap();
            assert_eq!(&body[..], br#"{"a":1}"#);
            assert_eq!(headers["content-type"], "application/json");
        }
    }

    #[tokio::test]
    async fn test_http_sink_rejected_status() {
        let (addr, _rx) = spawn_receiver(StatusCode::INTERNAL_SERVER_ERROR).await;
        let sink = HttpSink::new("test_http", &output_for(addr, HashMap::new())).unwrap();

        let err = sink.deliver(b"{}").await.unwrap_err();
        assert!(matches!(err, ContractError::SinkStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_http_sink_header_overrides() {
        let (addr, mut rx) = spawn_receiver(StatusCode::OK).await;
        let headers = HashMap::from([
            ("content-type".to_string(), "text/plain".to_string()),
            ("X-Api-Key".to_string(), "secret".to_string()),
        ]);
        let sink = HttpSink::new("test_http", &output_for(addr, headers)).unwrap();

        sink.deliver(b"plain").await.unwrap();

        let (headers, _) = rx.recv().await.unwrap();
        assert_eq!(headers["content-type"], "text/plain");
        assert_eq!(headers["x-api-key"], "secret");
    }

    #[tokio::test]
    async fn test_http_sink_unreachable() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sink = HttpSink::new("test_http", &output_for(addr, HashMap::new())).unwrap();
        let err = sink.deliver(b"{}").await.unwrap_err();
        assert!(matches!(err, ContractError::SinkConnection { .. }));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let headers = HashMap::from([("bad header".to_string(), "v".to_string())]);
        let output = output_for("127.0.0.1:1".parse().unwrap(), headers);
        assert!(HttpSink::new("test_http", &output).is_err());
    }
}
