use crate::core::{EncodedMessage, GelfMessage, GelfOptions, LogRecord};
use crate::utils::error::{GelfError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::Value;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

pub const GELF_VERSION: &str = "1.0";

/// Record attributes that never become `_extra` fields.
const RESERVED_FIELDS: &[&str] = &[
    "args",
    "asctime",
    "created",
    "exc_info",
    "exc_text",
    "filename",
    "funcName",
    "id",
    "levelname",
    "levelno",
    "lineno",
    "module",
    "msecs",
    "message",
    "msg",
    "name",
    "pathname",
    "process",
    "processName",
    "relativeCreated",
    "thread",
    "threadName",
];

type MessageFormatter = Arc<dyn Fn(&LogRecord) -> String + Send + Sync>;

/// Turns [`LogRecord`]s into GELF messages and wire payloads.
#[derive(Clone)]
pub struct GelfFormatter {
    options: GelfOptions,
    host: String,
    formatter: Option<MessageFormatter>,
}

impl fmt::Debug for GelfFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GelfFormatter")
            .field("options", &self.options)
            .field("host", &self.host)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

impl GelfFormatter {
    pub fn new(options: GelfOptions) -> Result<Self> {
        if options.fqdn && options.localname.is_some() {
            return Err(GelfError::config(
                "cannot specify 'fqdn' and 'localname' arguments together",
            ));
        }

        let host = resolve_host(options.fqdn, options.localname.as_deref());
        tracing::debug!("Resolved GELF host field: {}", host);

        Ok(Self {
            options,
            host,
            formatter: None,
        })
    }

    /// Renders `short_message` with `formatter` instead of the raw record message.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&LogRecord) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn options(&self) -> &GelfOptions {
        &self.options
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn make_gelf(&self, record: &LogRecord) -> GelfMessage {
        let short_message = match &self.formatter {
            Some(format) => format(record),
            None => record.message.clone(),
        };

        let mut gelf = GelfMessage::new();
        gelf.insert("version", GELF_VERSION);
        gelf.insert("host", self.host.clone());
        gelf.insert("short_message", short_message);
        gelf.insert("timestamp", record.timestamp());
        gelf.insert("level", record.level.syslog());
        gelf.insert(
            "facility",
            self.options
                .facility
                .clone()
                .unwrap_or_else(|| record.logger.clone()),
        );

        add_full_message(&mut gelf, record);
        if self.options.level_names {
            gelf.insert("level_name", record.level.name());
        }
        if let Some(facility) = &self.options.facility {
            gelf.insert("facility", facility.clone());
            gelf.insert("_logger", record.logger.clone());
        }
        if self.options.debugging_fields {
            add_debugging_fields(&mut gelf, record);
        }
        if self.options.extra_fields {
            add_extra_fields(&mut gelf, record);
        }
        if self.options.args_fields {
            add_args_fields(&mut gelf, record);
        }
        gelf
    }

    pub fn encode(&self, record: &LogRecord) -> Result<EncodedMessage> {
        let packed = pack(&self.make_gelf(record))?;
        if self.options.compress {
            Ok(EncodedMessage::new(compress(&packed)?, true))
        } else {
            Ok(EncodedMessage::new(packed, false))
        }
    }
}

fn add_full_message(gelf: &mut GelfMessage, record: &LogRecord) {
    if let Some(exc_text) = record.exc_text.as_deref().filter(|t| !t.is_empty()) {
        gelf.insert("full_message", exc_text);
    }
}

fn add_debugging_fields(gelf: &mut GelfMessage, record: &LogRecord) {
    if let Some(pathname) = &record.pathname {
        gelf.insert("file", pathname.clone());
    }
    if let Some(lineno) = record.lineno {
        gelf.insert("line", lineno);
    }
    if let Some(func_name) = &record.func_name {
        gelf.insert("_function", func_name.clone());
    }
    gelf.insert("_pid", record.process);
    if let Some(thread_name) = &record.thread_name {
        gelf.insert("_thread_name", thread_name.clone());
    }
    if let Some(process_name) = &record.process_name {
        gelf.insert("_process_name", process_name.clone());
    }
}

fn add_extra_fields(gelf: &mut GelfMessage, record: &LogRecord) {
    for (key, value) in &record.extra {
        if key.starts_with('_') || RESERVED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        gelf.insert(format!("_{}", key), value.clone());
    }
}

fn add_args_fields(gelf: &mut GelfMessage, record: &LogRecord) {
    let Some(args) = &record.args else {
        return;
    };
    for (key, value) in args {
        // GELF 保留 `_id`
        if key == "id" {
            continue;
        }
        gelf.insert(format!("_{}", key), value.clone());
    }
}

/// Sanitizes `message` and serializes it as compact UTF-8 JSON.
pub fn pack(message: &GelfMessage) -> Result<Vec<u8>> {
    let sanitized = sanitize(Value::Object(message.fields.clone()));
    Ok(serde_json::to_vec(&sanitized)?)
}

/// Booleans become `"True"`/`"False"` so a field keeps one type in Graylog.
pub fn sanitize(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::String(if b { "True" } else { "False" }.to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, sanitize(v))).collect()),
        other => other,
    }
}

pub fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

pub fn resolve_host(fqdn: bool, localname: Option<&str>) -> String {
    if fqdn {
        return resolve_fqdn();
    }
    match localname {
        Some(name) => name.to_string(),
        None => local_hostname(),
    }
}

fn local_hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}

fn resolve_fqdn() -> String {
    let hostname = local_hostname();
    match dns_lookup::lookup_host(&hostname) {
        Ok(addrs) => {
            for addr in addrs {
                if let Ok(name) = dns_lookup::lookup_addr(&addr) {
                    if name.contains('.') {
                        return name;
                    }
                }
            }
        }
        Err(e) => tracing::debug!("Could not resolve {} for fqdn lookup: {}", hostname, e),
    }
    hostname
}
