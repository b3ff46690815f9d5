//! Send log records to Graylog in the Graylog Extended Log Format (GELF).
//!
//! Transports:
//!  + [`UdpTransport`] - zlib-compressed datagrams, chunked when large
//!  + [`StreamTransport`] - NUL-framed GELF over TCP or TLS
//!  + [`HttpTransport`] - `POST` to a GELF HTTP input
//!
//! Records reach a transport through a [`GelfHandler`], either directly or
//! from `tracing` events via [`GelfLayer`].

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{HttpTransport, StreamTransport, TlsConnector, UdpTransport};
pub use config::toml_config::TomlConfig;
pub use core::{
    builder::build_handler,
    chunker::{Chunker, GELF_MAX_CHUNK_NUMBER},
    handler::GelfHandler,
    layer::{GelfLayer, GelfWorker},
    GelfOptions, Level, LogRecord, OverflowPolicy, TlsSettings, TransportKind, LAN_CHUNK,
    WAN_CHUNK,
};
pub use utils::error::{GelfError, Result};
