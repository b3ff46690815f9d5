use thiserror::Error;

#[derive(Error, Debug)]
pub enum GelfError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TLS error: {0}")]
    TlsError(#[from] rustls::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("GELF message needs {chunks} chunks, more than the allowed {max}")]
    ChunkOverflowError { chunks: usize, max: usize },

    #[error("Truncation failed to prevent chunk overflow for GELF message")]
    TruncationFailureError,

    #[error("Invalid GELF chunk: {reason}")]
    InvalidChunkError { reason: String },

    #[error("Invalid GELF message: {reason}")]
    InvalidMessageError { reason: String },

    #[error("Graylog HTTP input responded with status {status}")]
    HttpStatusError { status: u16 },

    #[error("{transport} transport unavailable: {reason}")]
    TransportUnavailableError { transport: String, reason: String },
}

pub type Result<T> = std::result::Result<T, GelfError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Encoding,
    Protocol,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl GelfError {
    pub fn config(message: impl Into<String>) -> Self {
        GelfError::ConfigError {
            message: message.into(),
        }
    }

    pub fn invalid_message(reason: impl Into<String>) -> Self {
        GelfError::InvalidMessageError {
            reason: reason.into(),
        }
    }

    pub fn invalid_chunk(reason: impl Into<String>) -> Self {
        GelfError::InvalidChunkError {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            GelfError::HttpError(_)
            | GelfError::HttpStatusError { .. }
            | GelfError::TransportUnavailableError { .. }
            | GelfError::TlsError(_) => ErrorCategory::Network,
            GelfError::ConfigError { .. }
            | GelfError::InvalidConfigValueError { .. }
            | GelfError::MissingConfigError { .. }
            | GelfError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            GelfError::SerializationError(_)
            | GelfError::ChunkOverflowError { .. }
            | GelfError::TruncationFailureError => ErrorCategory::Encoding,
            GelfError::InvalidChunkError { .. } | GelfError::InvalidMessageError { .. } => {
                ErrorCategory::Protocol
            }
            GelfError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單筆訊息被丟棄，不影響後續傳送
            ErrorCategory::Encoding | ErrorCategory::Protocol => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            GelfError::HttpError(_) | GelfError::HttpStatusError { .. } => {
                "Check that the Graylog GELF HTTP input is running and reachable".to_string()
            }
            GelfError::TransportUnavailableError { .. } => {
                "Graylog input is unreachable, the connection will be retried with backoff"
                    .to_string()
            }
            GelfError::TlsError(_) => {
                "Verify the CA bundle and client certificate, or disable validation".to_string()
            }
            GelfError::ConfigError { .. }
            | GelfError::InvalidConfigValueError { .. }
            | GelfError::ConfigValidationError { .. } => {
                "Review the configuration values and try again".to_string()
            }
            GelfError::MissingConfigError { field } => {
                format!("Provide a value for '{}'", field)
            }
            GelfError::ChunkOverflowError { .. } | GelfError::TruncationFailureError => {
                "Use a larger chunk size, enable compression or the truncate overflow policy"
                    .to_string()
            }
            GelfError::SerializationError(_)
            | GelfError::InvalidChunkError { .. }
            | GelfError::InvalidMessageError { .. } => {
                "The payload is not valid GELF, check the sender".to_string()
            }
            GelfError::IoError(_) => "Check file paths, permissions and network access".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not deliver log message: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Encoding => format!("Could not encode log message: {}", self),
            ErrorCategory::Protocol => format!("Malformed GELF data: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_high_severity() {
        let err = GelfError::MissingConfigError {
            field: "transport.ca_certs".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.recovery_suggestion().contains("transport.ca_certs"));
    }

    #[test]
    fn test_dropped_message_errors_are_low_severity() {
        let err = GelfError::ChunkOverflowError {
            chunks: 200,
            max: 128,
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.to_string().contains("200"));
    }

    #[test]
    fn test_network_errors_are_medium_severity() {
        let err = GelfError::HttpStatusError { status: 503 };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().starts_with("Could not deliver"));
    }
}
