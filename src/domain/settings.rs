use serde::{Deserialize, Serialize};
use std::fmt;

pub const WAN_CHUNK: usize = 1420;
pub const LAN_CHUNK: usize = 8154;

pub const DEFAULT_HTTP_PATH: &str = "/gelf";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Udp,
    Tcp,
    Tls,
    Http,
}

impl TransportKind {
    pub fn default_port(&self) -> u16 {
        match self {
            TransportKind::Tcp => 12201,
            TransportKind::Udp => 12202,
            TransportKind::Http => 12203,
            TransportKind::Tls => 12204,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportKind::Udp => "udp",
            TransportKind::Tcp => "tcp",
            TransportKind::Tls => "tls",
            TransportKind::Http => "http",
        };
        f.write_str(name)
    }
}

/// What to do with a UDP message that needs more than 128 chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    Drop,
    #[default]
    Warn,
    Truncate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GelfOptions {
    pub debugging_fields: bool,
    pub extra_fields: bool,
    pub args_fields: bool,
    pub fqdn: bool,
    pub localname: Option<String>,
    pub facility: Option<String>,
    pub level_names: bool,
    pub compress: bool,
}

impl Default for GelfOptions {
    fn default() -> Self {
        Self {
            debugging_fields: true,
            extra_fields: true,
            args_fields: true,
            fqdn: false,
            localname: None,
            facility: None,
            level_names: false,
            compress: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    pub validate: bool,
    pub ca_certs: Option<String>,
    pub certfile: Option<String>,
    pub keyfile: Option<String>,
}
