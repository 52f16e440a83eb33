//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{GatewayConfig, InboundProtocol, OutputProtocol, DATE_PLACEHOLDER};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    route_count: usize,
    http_routes: usize,
    tcp_routes: usize,
    udp_routes: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            let count = |protocol| {
                config
                    .routes
                    .iter()
                    .filter(|r| r.protocol == protocol)
                    .count()
            };

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    route_count: config.routes.len(),
                    http_routes: count(InboundProtocol::Http),
                    tcp_routes: count(InboundProtocol::Tcp),
                    udp_routes: count(InboundProtocol::Udp),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &GatewayConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.routes.is_empty() {
        warnings.push("No routes configured - the gateway will exit immediately".to_string());
    }

    for route in &config.routes {
        let output = &route.output;
        if output.protocol == OutputProtocol::File && !output.file_pattern.contains(DATE_PLACEHOLDER)
        {
            warnings.push(format!(
                "Route '{}': file_pattern has no {} placeholder - every record goes to one file",
                route.name, DATE_PLACEHOLDER
            ));
        }
        if matches!(output.protocol, OutputProtocol::Http | OutputProtocol::Https)
            && output.timeout().is_none()
        {
            warnings.push(format!(
                "Route '{}': HTTP output has no timeout - a stalled sink blocks its worker",
                route.name
            ));
        }
        if route.protocol != InboundProtocol::Http && route.entry.base_path != "/" {
            warnings.push(format!(
                "Route '{}': basePath is ignored for {} routes",
                route.name, route.protocol
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Routes: {}", summary.route_count);
            println!("  HTTP: {}", summary.http_routes);
            println!("  TCP: {}", summary.tcp_routes);
            println!("  UDP: {}", summary.udp_routes);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_warnings() {
        let config = ConfigLoader::load_from_str(
            r#"
routes:
  - protocol: tcp
    port: 9000
    name: plain-file
    output: { protocol: file, file_pattern: /tmp/gw.log }
  - protocol: udp
    port: 9001
    name: no-timeout
    output: { protocol: http, host: localhost, port: 8080, timeout: 0 }
"#,
            ConfigFormat::Yaml,
        )
        .unwrap();

        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 2, "{warnings:?}");
        assert!(warnings[0].contains("plain-file"));
        assert!(warnings[1].contains("no timeout"));
    }

    #[test]
    fn test_empty_config_warns() {
        let warnings = collect_warnings(&GatewayConfig::default());
        assert!(warnings[0].contains("No routes"));
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let args = ValidateArgs {
            config: "/nonexistent/protogate.yaml".into(),
            json: true,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
