use crate::core::{EncodedMessage, Transport};
use crate::utils::error::{GelfError, Result};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

pub struct HttpTransport {
    client: Client,
    url: Url,
}

impl HttpTransport {
    pub fn new(host: &str, port: u16, path: &str, timeout: Duration) -> Result<Self> {
        let url = gelf_url(host, port, path)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

pub fn gelf_url(host: &str, port: u16, path: &str) -> Result<Url> {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    let raw = format!("http://{}:{}{}", host, port, path);
    validate_url("transport.http_path", &raw)?;
    Url::parse(&raw).map_err(|e| GelfError::InvalidConfigValueError {
        field: "transport.http_path".to_string(),
        value: raw.clone(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, message: &EncodedMessage) -> Result<()> {
        let mut request = self.client.post(self.url.clone()).body(message.bytes.clone());
        if message.compressed {
            request = request.header("Content-Encoding", "gzip,deflate");
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("GELF HTTP input responded with {}", status);

        if !status.is_success() {
            return Err(GelfError::HttpStatusError {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gelf_url() {
        let url = gelf_url("graylog.local", 12203, "/gelf").unwrap();
        assert_eq!(url.as_str(), "http://graylog.local:12203/gelf");

        let url = gelf_url("10.0.0.5", 8080, "ingest/gelf").unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5:8080/ingest/gelf");
    }

    #[test]
    fn test_gelf_url_rejects_bad_host() {
        assert!(gelf_url("bad host", 12203, "/gelf").is_err());
    }
}
