use crate::core::codec::GelfFormatter;
use crate::core::{EncodedMessage, GelfMessage, GelfOptions, LogRecord, Transport};
use crate::utils::error::Result;
use std::sync::Arc;

/// Converts records to GELF and hands them to a [`Transport`].
#[derive(Clone)]
pub struct GelfHandler {
    formatter: GelfFormatter,
    transport: Arc<dyn Transport>,
}

impl GelfHandler {
    pub fn new<T: Transport + 'static>(options: GelfOptions, transport: T) -> Result<Self> {
        Self::from_shared(options, Arc::new(transport))
    }

    pub fn from_shared(mut options: GelfOptions, transport: Arc<dyn Transport>) -> Result<Self> {
        if options.compress && !transport.supports_compression() {
            tracing::debug!(
                "{} transport does not support compression, sending plain GELF",
                transport.name()
            );
            options.compress = false;
        }

        Ok(Self {
            formatter: GelfFormatter::new(options)?,
            transport,
        })
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&LogRecord) -> String + Send + Sync + 'static,
    {
        self.formatter = self.formatter.with_formatter(formatter);
        self
    }

    pub fn formatter(&self) -> &GelfFormatter {
        &self.formatter
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    pub fn make_gelf(&self, record: &LogRecord) -> GelfMessage {
        self.formatter.make_gelf(record)
    }

    pub fn encode(&self, record: &LogRecord) -> Result<EncodedMessage> {
        self.formatter.encode(record)
    }

    pub async fn emit(&self, record: &LogRecord) -> Result<()> {
        let encoded = self.encode(record)?;
        tracing::debug!(
            "Emitting GELF message via {} ({} bytes, compressed: {})",
            self.transport.name(),
            encoded.len(),
            encoded.compressed
        );
        self.transport.send(&encoded).await
    }
}
