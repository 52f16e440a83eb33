//! Output descriptor - where a route's transformed payloads go

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Placeholder substituted in `file_pattern`
pub const DATE_PLACEHOLDER: &str = "${DATE}";

/// Sink descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    /// Outbound sink kind
    pub protocol: OutputProtocol,

    /// Destination host (http/https/tcp/udp)
    #[serde(default)]
    pub host: String,

    /// Destination port (http/https/tcp/udp)
    #[serde(default)]
    pub port: u16,

    /// Request path (http/https)
    #[serde(default)]
    pub path: String,

    /// Client timeout in seconds, 0 disables it
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Header overrides (http/https)
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Destination file name, may contain `${DATE}`
    #[serde(default)]
    pub file_pattern: String,
}

fn default_timeout() -> u64 {
    30
}

impl Output {
    /// Configured client timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    /// `host:port` of a network sink
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Full URL of an HTTP sink
    pub fn url(&self) -> String {
        let path = if self.path.is_empty() || self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!("{}://{}:{}{}", self.protocol, self.host, self.port, path)
    }
}

/// Outbound sink kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputProtocol {
    Http,
    Https,
    Tcp,
    Udp,
    File,
}

impl OutputProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::File => "file",
        }
    }

    /// Whether the sink addresses a remote host
    pub fn is_network(&self) -> bool {
        !matches!(self, Self::File)
    }
}

impl fmt::Display for OutputProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
