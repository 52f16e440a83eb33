//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::GatewayConfig;
use ingestion::Gateway;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::stats::print_summary;

/// Execute the `run` command
pub async fn run_gateway(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(routes = config.routes.len(), "Configuration loaded");

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let token = CancellationToken::new();
    let gateway = Gateway::bind(&config, token.clone())
        .await
        .context("Failed to start listeners")?;

    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping gateway...");
        token.cancel();
    });

    info!("Gateway started");
    let stats = gateway.run().await;

    info!(
        received = stats.total_received(),
        dispatched = stats.total_dispatched(),
        dropped = stats.total_dropped(),
        duration_secs = stats.duration.as_secs_f64(),
        "Gateway finished"
    );
    print_summary(&stats);

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &GatewayConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Routes ({}):", config.routes.len());
    for route in &config.routes {
        println!(
            "  - {} ({} :{}) -> {}",
            route.name, route.protocol, route.port, route.output.protocol
        );
    }
    println!();
}
