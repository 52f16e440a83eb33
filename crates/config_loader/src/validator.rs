//! Configuration validation
//!
//! Rules:
//! - route names are non-empty and unique
//! - inbound ports are non-zero
//! - HTTP base paths start with `/` and hold no `:` or `*` capture syntax
//! - listeners do not collide on a port (HTTP routes may share one by path)
//! - network outputs name a host and port, file outputs name a pattern
//! - remap rules and header names are non-empty

use std::collections::{HashMap, HashSet};

use contracts::{ContractError, GatewayConfig, InboundProtocol, Route};

/// Validate a loaded configuration
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &GatewayConfig) -> Result<(), ContractError> {
    validate_route_names(config)?;
    for (idx, route) in config.routes.iter().enumerate() {
        validate_entry(idx, route)?;
        validate_transform(idx, route)?;
        validate_output(idx, route)?;
    }
    validate_port_bindings(config)?;
    Ok(())
}

/// Route names are unique and non-empty
fn validate_route_names(config: &GatewayConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("routes[{idx}].name"),
                "route name cannot be empty",
            ));
        }
        if !seen.insert(route.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("routes[name={}]", route.name),
                "duplicate route name",
            ));
        }
    }
    Ok(())
}

fn validate_entry(idx: usize, route: &Route) -> Result<(), ContractError> {
    if route.port == 0 {
        return Err(ContractError::config_validation(
            format!("routes[{idx}].port"),
            "inbound port must be > 0",
        ));
    }

    if route.protocol == InboundProtocol::Http && !route.entry.base_path.starts_with('/') {
        return Err(ContractError::config_validation(
            format!("routes[{idx}].entry.basePath"),
            format!("base path '{}' must start with '/'", route.entry.base_path),
        ));
    }

    if route.protocol == InboundProtocol::Http && route.entry.base_path.contains([':', '*']) {
        return Err(ContractError::config_validation(
            format!("routes[{idx}].entry.basePath"),
            format!(
                "base path '{}' must be literal (no ':' or '*')",
                route.entry.base_path
            ),
        ));
    }

    Ok(())
}

fn validate_transform(idx: usize, route: &Route) -> Result<(), ContractError> {
    for (rule_idx, rule) in route.transform.remap.iter().enumerate() {
        if rule.source.is_empty() || rule.target.is_empty() {
            return Err(ContractError::config_validation(
                format!("routes[{idx}].transform.remap[{rule_idx}]"),
                "remap source and target cannot be empty",
            ));
        }
    }
    Ok(())
}

fn validate_output(idx: usize, route: &Route) -> Result<(), ContractError> {
    let output = &route.output;

    if output.protocol.is_network() {
        if output.host.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("routes[{idx}].output.host"),
                format!("{} output requires a host", output.protocol),
            ));
        }
        if output.port == 0 {
            return Err(ContractError::config_validation(
                format!("routes[{idx}].output.port"),
                format!("{} output requires a port > 0", output.protocol),
            ));
        }
    } else if output.file_pattern.trim().is_empty() {
        return Err(ContractError::config_validation(
            format!("routes[{idx}].output.file_pattern"),
            "file output requires a file_pattern",
        ));
    }

    if output.headers.keys().any(|name| name.trim().is_empty()) {
        return Err(ContractError::config_validation(
            format!("routes[{idx}].output.headers"),
            "header name cannot be empty",
        ));
    }

    Ok(())
}

/// Detect listeners that would fight over the same socket
fn validate_port_bindings(config: &GatewayConfig) -> Result<(), ContractError> {
    // port -> (protocol, routes bound so far)
    let mut stream_ports: HashMap<u16, (InboundProtocol, Vec<&Route>)> = HashMap::new();
    let mut datagram_ports: HashMap<u16, &Route> = HashMap::new();

    for route in &config.routes {
        if route.protocol == InboundProtocol::Udp {
            if let Some(existing) = datagram_ports.insert(route.port, route) {
                return Err(port_conflict(route, existing));
            }
            continue;
        }

        let (protocol, bound) = stream_ports
            .entry(route.port)
            .or_insert_with(|| (route.protocol, Vec::new()));

        if let Some(existing) = bound.first() {
            if *protocol != InboundProtocol::Http || route.protocol != InboundProtocol::Http {
                return Err(port_conflict(route, existing));
            }
            if let Some(same_path) = bound
                .iter()
                .find(|other| other.entry.base_path == route.entry.base_path)
            {
                return Err(ContractError::config_validation(
                    format!("routes[name={}].entry.basePath", route.name),
                    format!(
                        "base path '{}' on port {} already served by route '{}'",
                        route.entry.base_path, route.port, same_path.name
                    ),
                ));
            }
        }
        bound.push(route);
    }

    Ok(())
}

fn port_conflict(route: &Route, existing: &Route) -> ContractError {
    ContractError::config_validation(
        format!("routes[name={}].port", route.name),
        format!(
            "{} port {} already bound by route '{}'",
            route.protocol, route.port, existing.name
        ),
    )
}
