// Adapters layer: GELF transports (udp, tcp, tls, http).

pub mod http;
pub mod tcp;
pub mod tls;
pub mod udp;

pub use http::HttpTransport;
pub use tcp::{RetryPolicy, StreamTransport, TcpConnector};
pub use tls::TlsConnector;
pub use udp::UdpTransport;
