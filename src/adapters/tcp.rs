//! NUL-framed GELF over a byte stream, shared by the TCP and TLS transports.

use crate::core::{EncodedMessage, Transport};
use crate::utils::error::{GelfError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: AsyncWrite + Unpin + Send;

    async fn connect(&self, host: &str, port: u16) -> Result<Self::Stream>;

    fn name(&self) -> &'static str;
}

pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, host: &str, port: u16) -> Result<TcpStream> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn name(&self) -> &'static str {
        "tcp"
    }
}

/// Exponential reconnect backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub start: Duration,
    pub factor: f64,
    pub max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            start: Duration::from_secs(1),
            factor: 2.0,
            max: Duration::from_secs(30),
        }
    }
}

struct Connection<S> {
    stream: Option<S>,
    retry_at: Option<Instant>,
    retry_period: Duration,
}

pub struct StreamTransport<C: Connector> {
    host: String,
    port: u16,
    connector: C,
    retry: RetryPolicy,
    connect_timeout: Duration,
    connection: Mutex<Connection<C::Stream>>,
}

impl StreamTransport<TcpConnector> {
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, TcpConnector)
    }
}

impl<C: Connector> StreamTransport<C> {
    pub fn new(host: impl Into<String>, port: u16, connector: C) -> Self {
        Self {
            host: host.into(),
            port,
            connector,
            retry: RetryPolicy::default(),
            connect_timeout: CONNECT_TIMEOUT,
            connection: Mutex::new(Connection {
                stream: None,
                retry_at: None,
                retry_period: Duration::ZERO,
            }),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    async fn ensure_connected<'a>(
        &self,
        connection: &'a mut Connection<C::Stream>,
    ) -> Result<&'a mut C::Stream> {
        if connection.stream.is_none() {
            if let Some(retry_at) = connection.retry_at {
                if Instant::now() < retry_at {
                    return Err(self.unavailable("waiting for reconnect backoff".to_string()));
                }
            }

            let attempt = tokio::time::timeout(
                self.connect_timeout,
                self.connector.connect(&self.host, self.port),
            )
            .await
            .unwrap_or_else(|_| Err(self.unavailable("connect timed out".to_string())));

            match attempt {
                Ok(stream) => {
                    tracing::debug!(
                        "{} connection established to {}:{}",
                        self.connector.name(),
                        self.host,
                        self.port
                    );
                    connection.stream = Some(stream);
                    connection.retry_at = None;
                }
                Err(e) => {
                    connection.retry_period = if connection.retry_at.is_none() {
                        self.retry.start
                    } else {
                        connection
                            .retry_period
                            .mul_f64(self.retry.factor)
                            .min(self.retry.max)
                    };
                    connection.retry_at = Some(Instant::now() + connection.retry_period);
                    tracing::debug!(
                        "{} connect to {}:{} failed, retrying in {:?}: {}",
                        self.connector.name(),
                        self.host,
                        self.port,
                        connection.retry_period,
                        e
                    );
                    return Err(e);
                }
            }
        }

        connection
            .stream
            .as_mut()
            .ok_or_else(|| self.unavailable("not connected".to_string()))
    }

    fn unavailable(&self, reason: String) -> GelfError {
        GelfError::TransportUnavailableError {
            transport: self.connector.name().to_string(),
            reason,
        }
    }
}

#[async_trait]
impl<C: Connector> Transport for StreamTransport<C> {
    async fn send(&self, message: &EncodedMessage) -> Result<()> {
        let mut frame = Vec::with_capacity(message.len() + 1);
        frame.extend_from_slice(&message.bytes);
        frame.push(0);

        let mut connection = self.connection.lock().await;
        let stream = self.ensure_connected(&mut connection).await?;

        let written = match stream.write_all(&frame).await {
            Ok(()) => stream.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            // 連線中斷：關閉並丟棄此訊息，下次送出時重連
            connection.stream = None;
            return Err(e.into());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.connector.name()
    }

    fn supports_compression(&self) -> bool {
        false
    }
}
