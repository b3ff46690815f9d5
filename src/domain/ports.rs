use crate::domain::model::EncodedMessage;
use crate::domain::settings::{GelfOptions, OverflowPolicy, TlsSettings, TransportKind};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: &EncodedMessage) -> Result<()>;

    fn name(&self) -> &'static str;

    /// NUL 分隔的串流傳輸無法攜帶壓縮內容
    fn supports_compression(&self) -> bool {
        true
    }
}

pub trait ConfigProvider: Send + Sync {
    fn transport(&self) -> TransportKind;
    fn host(&self) -> &str;
    fn port(&self) -> Option<u16>;
    fn gelf_options(&self) -> GelfOptions;
    fn chunk_size(&self) -> usize;
    fn overflow_policy(&self) -> OverflowPolicy;
    fn tls_settings(&self) -> TlsSettings;
    fn http_path(&self) -> &str;
    fn http_timeout(&self) -> Duration;

    fn resolved_port(&self) -> u16 {
        self.port().unwrap_or_else(|| self.transport().default_port())
    }
}
