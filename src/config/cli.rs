use crate::core::{ConfigProvider, GelfOptions, Level, OverflowPolicy, TlsSettings, TransportKind, WAN_CHUNK};
use crate::domain::settings::{DEFAULT_HTTP_PATH, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::utils::error::Result;
use crate::utils::validation::{validate_settings, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "gelf-send")]
#[command(about = "Send log messages to Graylog in the Graylog Extended Log Format (GELF)")]
pub struct CliConfig {
    /// GELF input transport
    #[arg(long, value_enum, default_value_t = TransportKind::Udp)]
    pub transport: TransportKind,

    /// Graylog input host
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Graylog input port (default depends on the transport)
    #[arg(long)]
    pub port: Option<u16>,

    /// Replace the facility field; the logger name moves to `_logger`
    #[arg(long)]
    pub facility: Option<String>,

    /// Host name to report instead of the local hostname
    #[arg(long)]
    pub localname: Option<String>,

    /// Report the fully qualified domain name of this host
    #[arg(long)]
    pub fqdn: bool,

    /// Add a `level_name` field
    #[arg(long)]
    pub level_names: bool,

    #[arg(long)]
    pub no_debugging_fields: bool,

    #[arg(long)]
    pub no_extra_fields: bool,

    #[arg(long)]
    pub no_args_fields: bool,

    /// Send uncompressed GELF (always the case for tcp and tls)
    #[arg(long)]
    pub no_compress: bool,

    /// UDP chunk size (1420 for WAN, 8154 for LAN)
    #[arg(long, default_value_t = WAN_CHUNK)]
    pub chunk_size: usize,

    /// What to do with UDP messages needing more than 128 chunks
    #[arg(long, value_enum, default_value_t = OverflowPolicy::Warn)]
    pub overflow: OverflowPolicy,

    /// Validate the server certificate against --ca-certs
    #[arg(long)]
    pub validate: bool,

    #[arg(long)]
    pub ca_certs: Option<String>,

    #[arg(long)]
    pub certfile: Option<String>,

    #[arg(long)]
    pub keyfile: Option<String>,

    #[arg(long, default_value = DEFAULT_HTTP_PATH)]
    pub http_path: String,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Load transport and handler settings from a TOML file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Message to send; lines from stdin are sent when omitted
    #[arg(short, long)]
    pub message: Option<String>,

    #[arg(long, default_value = "info")]
    pub level: Level,

    /// Logger name, used as the facility unless --facility is given
    #[arg(long, default_value = "gelf-send")]
    pub logger: String,

    /// Extra field as key=value (value parsed as JSON when possible)
    #[arg(short = 'f', long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, Value)>,

    /// Print the GELF messages instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

pub fn parse_field(raw: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid field '{}', expected key=value", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid field '{}', key is empty", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

impl ConfigProvider for CliConfig {
    fn transport(&self) -> TransportKind {
        self.transport
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> Option<u16> {
        self.port
    }

    fn gelf_options(&self) -> GelfOptions {
        GelfOptions {
            debugging_fields: !self.no_debugging_fields,
            extra_fields: !self.no_extra_fields,
            args_fields: !self.no_args_fields,
            fqdn: self.fqdn,
            localname: self.localname.clone(),
            facility: self.facility.clone(),
            level_names: self.level_names,
            compress: !self.no_compress,
        }
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow
    }

    fn tls_settings(&self) -> TlsSettings {
        TlsSettings {
            validate: self.validate,
            ca_certs: self.ca_certs.clone(),
            certfile: self.certfile.clone(),
            keyfile: self.keyfile.clone(),
        }
    }

    fn http_path(&self) -> &str {
        &self.http_path
    }

    fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(self)
    }
}
