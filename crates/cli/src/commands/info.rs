//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{GatewayConfig, InboundProtocol, OutputProtocol, Route};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    routes: Vec<RouteInfo>,
}

#[derive(Serialize)]
struct RouteInfo {
    name: String,
    protocol: String,
    port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_path: Option<String>,
    content_type: String,
    compressed: bool,
    output: OutputInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    transform: Option<TransformInfo>,
}

#[derive(Serialize)]
struct OutputInfo {
    protocol: String,
    destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
}

#[derive(Serialize)]
struct TransformInfo {
    remap: Vec<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    static_fields: HashMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    remove_fields: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args.transforms);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args.transforms);
    }

    Ok(())
}

/// Sink destination as shown to users
fn destination(route: &Route) -> String {
    let output = &route.output;
    match output.protocol {
        OutputProtocol::Http | OutputProtocol::Https => output.url(),
        OutputProtocol::Tcp | OutputProtocol::Udp => output.authority(),
        OutputProtocol::File => output.file_pattern.clone(),
    }
}

fn remap_rules(route: &Route) -> Vec<String> {
    route
        .transform
        .remap
        .iter()
        .map(|rule| {
            let keep = if rule.preserve_source { " (keep)" } else { "" };
            format!("{} -> {}{}", rule.source, rule.target, keep)
        })
        .collect()
}

fn build_config_info(config: &GatewayConfig, transforms: bool) -> ConfigInfo {
    let routes = config
        .routes
        .iter()
        .map(|route| RouteInfo {
            name: route.name.clone(),
            protocol: route.protocol.to_string(),
            port: route.port,
            base_path: (route.protocol == InboundProtocol::Http)
                .then(|| route.entry.base_path.clone()),
            content_type: route.entry.content_type.to_string(),
            compressed: route.entry.compressed,
            output: OutputInfo {
                protocol: route.output.protocol.to_string(),
                destination: destination(route),
                timeout_secs: route.output.timeout().map(|t| t.as_secs()),
            },
            transform: transforms.then(|| TransformInfo {
                remap: remap_rules(route),
                static_fields: route.transform.static_fields.clone(),
                remove_fields: route.transform.remove_fields.clone(),
            }),
        })
        .collect();

    ConfigInfo { routes }
}

fn print_config_info(config: &GatewayConfig, transforms: bool) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  protogate Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🔀 Routes ({})", config.routes.len());
    for (i, route) in config.routes.iter().enumerate() {
        let is_last = i == config.routes.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child = if is_last { "   " } else { "│  " };

        println!("   {} {} ({} :{})", prefix, route.name, route.protocol, route.port);
        if route.protocol == InboundProtocol::Http {
            println!("   {}  ├─ Path: {}", child, route.entry.base_path);
        }
        println!(
            "   {}  ├─ Content: {}{}",
            child,
            route.entry.content_type,
            if route.entry.compressed { " (gzip)" } else { "" }
        );

        if transforms && !route.transform.is_empty() {
            println!("   {}  ├─ Transform", child);
            for rule in remap_rules(route) {
                println!("   {}  │   ├─ remap {}", child, rule);
            }
            for (key, value) in &route.transform.static_fields {
                println!("   {}  │   ├─ set {} = {:?}", child, key, value);
            }
            for field in &route.transform.remove_fields {
                println!("   {}  │   ├─ remove {}", child, field);
            }
        }

        println!(
            "   {}  └─ Output: {} {}",
            child,
            route.output.protocol,
            destination(route)
        );
    }

    println!();
}
