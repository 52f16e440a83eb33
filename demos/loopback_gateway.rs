//! Loopback Gateway Example
//!
//! Starts a single TCP -> file route on an ephemeral port, feeds it a few
//! messages from an in-process client and prints the resulting records.
//!
//! Run with: cargo run -p demos --bin loopback_gateway [config.yaml]

use std::time::Duration;

use config_loader::{ConfigFormat, ConfigLoader};
use contracts::GatewayConfig;
use ingestion::Gateway;
use observability::{LogFormat, ObservabilityConfig};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

const DEMO_CONFIG: &str = r#"
routes:
  - protocol: tcp
    port: 9000
    name: demo
    entry:
      content_type: json
    transform:
      remap:
        - source: level
          target: severity
      static_fields:
        service: gw
      remove_fields: [debug]
    output:
      protocol: file
      file_pattern: ./demo-out/demo-${DATE}.log
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init_with_config(ObservabilityConfig {
        log_format: LogFormat::Compact,
        ..Default::default()
    })?;

    tracing::info!("Starting loopback gateway demo");

    // ==== Stage 1: Load config ====
    let mut config: GatewayConfig = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading gateway config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        ConfigLoader::load_from_str(DEMO_CONFIG, ConfigFormat::Yaml)?
    };
    // Ephemeral ports so the demo never collides with a running gateway
    for route in &mut config.routes {
        route.port = 0;
    }

    // ==== Stage 2: Bind ====
    let token = CancellationToken::new();
    let gateway = Gateway::bind(&config, token.clone()).await?;
    let Some(first) = config
        .routes
        .iter()
        .find(|r| r.protocol == contracts::InboundProtocol::Tcp)
    else {
        tracing::warn!("No TCP route to feed, exiting");
        return Ok(());
    };
    let addr = gateway
        .local_addr(&first.name)
        .ok_or("route has no bound address")?;
    let target = format!("127.0.0.1:{}", addr.port());

    let running = tokio::spawn(gateway.run());

    // ==== Stage 3: Feed messages ====
    let mut client = TcpStream::connect(&target).await?;
    for (i, level) in ["info", "warn", "error"].iter().enumerate() {
        let message = format!(r#"{{"level":"{level}","msg":"demo message {i}","debug":true}}"#);
        client.write_all(message.as_bytes()).await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    drop(client);

    // ==== Stage 4: Shut down ====
    tokio::time::sleep(Duration::from_millis(200)).await;
    token.cancel();
    let stats = running.await?;

    for route in &stats.routes {
        tracing::info!(
            route = %route.name,
            received = route.counters.received,
            dispatched = route.counters.dispatched,
            dropped = route.counters.dropped,
            "Route finished"
        );
    }
    println!(
        "Dispatched {} of {} messages; see the file pattern of route '{}'",
        stats.total_dispatched(),
        stats.total_received(),
        first.name
    );

    Ok(())
}
