//! Route table - Config Loader output
//!
//! Describes every gateway pipeline: inbound transport, entry decoding,
//! transform rules and the outbound sink.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};

use crate::{Output, Transform};

/// Complete gateway configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Route definitions, one listener per entry
    #[serde(default)]
    pub routes: Vec<Route>,
}

/// One inbound-protocol-to-outbound-protocol pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Inbound transport
    pub protocol: InboundProtocol,

    /// Inbound bind port
    pub port: u16,

    /// Human-readable route id
    pub name: String,

    /// Inbound decoding
    #[serde(default)]
    pub entry: EntryConfig,

    /// Field transformation rules
    #[serde(default)]
    pub transform: Transform,

    /// Outbound sink
    pub output: Output,
}

impl Route {
    /// Address the listener binds to (all interfaces)
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

/// Inbound transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundProtocol {
    Http,
    Tcp,
    Udp,
}

impl InboundProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }

    /// Whether listeners of this protocol occupy a TCP port
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Http | Self::Tcp)
    }
}

impl fmt::Display for InboundProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound decoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConfig {
    /// HTTP routing key (HTTP routes only)
    #[serde(rename = "basePath", alias = "base_path", default = "default_base_path")]
    pub base_path: String,

    /// Framing/parsing kind
    #[serde(default)]
    pub content_type: ContentKind,

    /// Gzip envelope expected
    #[serde(default)]
    pub compressed: bool,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            content_type: ContentKind::default(),
            compressed: false,
        }
    }
}

fn default_base_path() -> String {
    "/".to_string()
}

/// Declared payload kind
///
/// Drives both framing and transformation. Any value other than `json` or
/// `text` is kept verbatim as an opaque kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentKind {
    Json,
    Text,
    Opaque(String),
}

impl ContentKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Opaque(other) => other,
        }
    }
}

impl Default for ContentKind {
    fn default() -> Self {
        Self::Opaque(String::new())
    }
}

impl From<String> for ContentKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "json" => Self::Json,
            "text" => Self::Text,
            _ => Self::Opaque(value),
        }
    }
}

impl From<&str> for ContentKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ContentKind> for String {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Json => "json".to_string(),
            ContentKind::Text => "text".to_string(),
            ContentKind::Opaque(other) => other,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
