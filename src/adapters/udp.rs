use crate::core::chunker::Chunker;
use crate::core::{EncodedMessage, Transport};
use crate::utils::error::{GelfError, Result};
use async_trait::async_trait;
use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::OnceCell;

pub struct UdpTransport {
    host: String,
    port: u16,
    chunker: Chunker,
    socket: OnceCell<UdpSocket>,
}

impl UdpTransport {
    pub fn new(host: impl Into<String>, port: u16, chunker: Chunker) -> Self {
        Self {
            host: host.into(),
            port,
            chunker,
            socket: OnceCell::new(),
        }
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    async fn socket(&self) -> Result<&UdpSocket> {
        self.socket
            .get_or_try_init(|| async {
                let addr = lookup_host((self.host.as_str(), self.port))
                    .await?
                    .next()
                    .ok_or_else(|| GelfError::TransportUnavailableError {
                        transport: "udp".to_string(),
                        reason: format!("could not resolve {}", self.host),
                    })?;
                let bind = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
                let socket = UdpSocket::bind(bind).await?;
                socket.connect(addr).await?;
                tracing::debug!("UDP socket {} connected to {}", socket.local_addr()?, addr);
                Ok::<_, GelfError>(socket)
            })
            .await
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, message: &EncodedMessage) -> Result<()> {
        let socket = self.socket().await?;

        if message.len() < self.chunker.chunk_size() {
            socket.send(&message.bytes).await?;
            return Ok(());
        }

        let chunks = self.chunker.chunk_message(message)?;
        tracing::debug!("Sending GELF message as {} UDP chunks", chunks.len());
        for chunk in chunks {
            socket.send(&chunk).await?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "udp"
    }
}
