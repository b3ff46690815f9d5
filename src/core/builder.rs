use crate::adapters::http::HttpTransport;
use crate::adapters::tcp::StreamTransport;
use crate::adapters::tls::TlsConnector;
use crate::adapters::udp::UdpTransport;
use crate::core::chunker::Chunker;
use crate::core::handler::GelfHandler;
use crate::core::{ConfigProvider, TransportKind};
use crate::utils::error::Result;
use crate::utils::validation::validate_settings;

/// Validates `config` and builds a handler for the configured transport.
pub fn build_handler<C: ConfigProvider + ?Sized>(config: &C) -> Result<GelfHandler> {
    validate_settings(config)?;

    let host = config.host().to_string();
    let port = config.resolved_port();
    let options = config.gelf_options();

    tracing::info!("📡 GELF {} transport -> {}:{}", config.transport(), host, port);

    match config.transport() {
        TransportKind::Udp => {
            let chunker = Chunker::new(config.chunk_size(), config.overflow_policy());
            GelfHandler::new(options, UdpTransport::new(host, port, chunker))
        }
        TransportKind::Tcp => GelfHandler::new(options, StreamTransport::tcp(host, port)),
        TransportKind::Tls => {
            let connector = TlsConnector::new(&config.tls_settings())?;
            GelfHandler::new(options, StreamTransport::new(host, port, connector))
        }
        TransportKind::Http => {
            let transport =
                HttpTransport::new(&host, port, config.http_path(), config.http_timeout())?;
            GelfHandler::new(options, transport)
        }
    }
}
