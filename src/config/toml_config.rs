use crate::core::{ConfigProvider, GelfOptions, OverflowPolicy, TlsSettings, TransportKind, WAN_CHUNK};
use crate::domain::settings::{DEFAULT_HTTP_PATH, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::utils::error::{GelfError, Result};
use crate::utils::validation::{validate_settings, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub handler: GelfOptions,
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub r#type: TransportKind,
    pub host: String,
    pub port: Option<u16>,
    pub chunk_size: Option<usize>,
    pub overflow: Option<OverflowPolicy>,
    pub path: Option<String>,
    pub timeout_seconds: Option<u64>,
    #[serde(flatten)]
    pub tls: TlsSettings,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GelfError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| GelfError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GRAYLOG_HOST})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| GelfError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl ConfigProvider for TomlConfig {
    fn transport(&self) -> TransportKind {
        self.transport.r#type
    }

    fn host(&self) -> &str {
        &self.transport.host
    }

    fn port(&self) -> Option<u16> {
        self.transport.port
    }

    fn gelf_options(&self) -> GelfOptions {
        self.handler.clone()
    }

    fn chunk_size(&self) -> usize {
        self.transport.chunk_size.unwrap_or(WAN_CHUNK)
    }

    fn overflow_policy(&self) -> OverflowPolicy {
        self.transport.overflow.unwrap_or_default()
    }

    fn tls_settings(&self) -> TlsSettings {
        self.transport.tls.clone()
    }

    fn http_path(&self) -> &str {
        self.transport.path.as_deref().unwrap_or(DEFAULT_HTTP_PATH)
    }

    fn http_timeout(&self) -> Duration {
        Duration::from_secs(
            self.transport
                .timeout_seconds
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        )
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(self)
    }
}
