use crate::adapters::http::gelf_url;
use crate::adapters::tls::check_settings;
use crate::core::{ConfigProvider, TransportKind};
use crate::utils::error::{GelfError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(GelfError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(GelfError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(GelfError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(GelfError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(GelfError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(GelfError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| GelfError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GelfError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(GelfError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Checks the settings a handler is built from, per transport.
pub fn validate_settings<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_non_empty_string("transport.host", config.host())?;

    if let Some(port) = config.port() {
        validate_range("transport.port", port, 1, u16::MAX)?;
    }

    let options = config.gelf_options();
    if options.fqdn && options.localname.is_some() {
        return Err(GelfError::ConfigValidationError {
            field: "handler.localname".to_string(),
            message: "cannot specify 'fqdn' and 'localname' arguments together".to_string(),
        });
    }
    if let Some(facility) = &options.facility {
        validate_non_empty_string("handler.facility", facility)?;
    }

    match config.transport() {
        TransportKind::Udp => {
            validate_positive_number("transport.chunk_size", config.chunk_size(), 1)?;
        }
        TransportKind::Tcp => {}
        TransportKind::Tls => {
            let tls = config.tls_settings();
            if tls.validate {
                validate_required_field("transport.ca_certs", &tls.ca_certs)?;
            }
            for (field, path) in [
                ("transport.ca_certs", &tls.ca_certs),
                ("transport.certfile", &tls.certfile),
                ("transport.keyfile", &tls.keyfile),
            ] {
                if let Some(path) = path {
                    validate_path(field, path)?;
                }
            }
            check_settings(&tls)?;
        }
        TransportKind::Http => {
            gelf_url(config.host(), config.resolved_port(), config.http_path())?;
            if config.http_timeout().is_zero() {
                return Err(GelfError::InvalidConfigValueError {
                    field: "transport.timeout_seconds".to_string(),
                    value: "0".to_string(),
                    reason: "Timeout must be greater than zero".to_string(),
                });
            }
        }
    }

    Ok(())
}
