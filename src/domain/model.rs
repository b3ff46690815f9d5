use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Logging level of a record, numbered like the classic logging levels
/// (`CRITICAL=50` .. `DEBUG=10`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Other(u32),
}

impl Level {
    pub fn levelno(&self) -> u32 {
        match self {
            Level::Critical => 50,
            Level::Error => 40,
            Level::Warning => 30,
            Level::Info => 20,
            Level::Debug => 10,
            Level::Other(n) => *n,
        }
    }

    pub fn from_levelno(levelno: u32) -> Self {
        match levelno {
            50 => Level::Critical,
            40 => Level::Error,
            30 => Level::Warning,
            20 => Level::Info,
            10 => Level::Debug,
            n => Level::Other(n),
        }
    }

    /// Syslog severity sent as the GELF `level` field. Unknown levels pass
    /// through unchanged.
    pub fn syslog(&self) -> u32 {
        match self {
            Level::Critical => 2,
            Level::Error => 3,
            Level::Warning => 4,
            Level::Info => 6,
            Level::Debug => 7,
            Level::Other(n) => *n,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Level::Critical => "CRITICAL".to_string(),
            Level::Error => "ERROR".to_string(),
            Level::Warning => "WARNING".to_string(),
            Level::Info => "INFO".to_string(),
            Level::Debug => "DEBUG".to_string(),
            Level::Other(n) => format!("Level {}", n),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" | "fatal" => Ok(Level::Critical),
            "error" => Ok(Level::Error),
            "warning" | "warn" => Ok(Level::Warning),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            other => other
                .parse::<u32>()
                .map(Level::from_levelno)
                .map_err(|_| format!("unknown log level: {}", s)),
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::INFO => Level::Info,
            // GELF 沒有 trace 等級，併入 debug
            tracing::Level::DEBUG | tracing::Level::TRACE => Level::Debug,
        }
    }
}

/// A log record before it is turned into GELF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub logger: String,
    pub level: Level,
    pub message: String,
    pub created: DateTime<Utc>,
    pub pathname: Option<String>,
    pub lineno: Option<u32>,
    pub func_name: Option<String>,
    pub process: u32,
    pub process_name: Option<String>,
    pub thread_name: Option<String>,
    pub exc_text: Option<String>,
    pub extra: Map<String, Value>,
    pub args: Option<Map<String, Value>>,
}

impl LogRecord {
    pub fn new(logger: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        Self {
            logger: logger.into(),
            level,
            message: message.into(),
            created: Utc::now(),
            pathname: None,
            lineno: None,
            func_name: None,
            process: std::process::id(),
            process_name: current_process_name(),
            thread_name: std::thread::current().name().map(str::to_string),
            exc_text: None,
            extra: Map::new(),
            args: None,
        }
    }

    pub fn with_location(
        mut self,
        pathname: impl Into<String>,
        lineno: u32,
        func_name: Option<String>,
    ) -> Self {
        self.pathname = Some(pathname.into());
        self.lineno = Some(lineno);
        self.func_name = func_name;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn with_args(mut self, args: Map<String, Value>) -> Self {
        self.args = Some(args);
        self
    }

    pub fn with_exc_text(mut self, exc_text: impl Into<String>) -> Self {
        self.exc_text = Some(exc_text.into());
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    /// Seconds since the epoch with microsecond precision.
    pub fn timestamp(&self) -> f64 {
        self.created.timestamp() as f64 + f64::from(self.created.timestamp_subsec_micros()) / 1e6
    }
}

fn current_process_name() -> Option<String> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
}

/// A GELF message as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GelfMessage {
    pub fields: Map<String, Value>,
}

impl GelfMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn short_message(&self) -> Option<&str> {
        self.get_str("short_message")
    }

    pub fn host(&self) -> Option<&str> {
        self.get_str("host")
    }

    pub fn level(&self) -> Option<u64> {
        self.fields.get("level").and_then(Value::as_u64)
    }
}

/// Bytes ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage {
    pub bytes: Vec<u8>,
    pub compressed: bool,
}

impl EncodedMessage {
    pub fn new(bytes: Vec<u8>, compressed: bool) -> Self {
        Self { bytes, compressed }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syslog_mapping() {
        assert_eq!(Level::Critical.syslog(), 2);
        assert_eq!(Level::Error.syslog(), 3);
        assert_eq!(Level::Warning.syslog(), 4);
        assert_eq!(Level::Info.syslog(), 6);
        assert_eq!(Level::Debug.syslog(), 7);
        assert_eq!(Level::Other(25).syslog(), 25);
    }

    #[test]
    fn test_level_names_and_numbers() {
        assert_eq!(Level::from_levelno(30), Level::Warning);
        assert_eq!(Level::from_levelno(35), Level::Other(35));
        assert_eq!(Level::Other(35).name(), "Level 35");
        assert_eq!(Level::Critical.levelno(), 50);
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("error".parse::<Level>().unwrap(), Level::Error);
        assert_eq!("20".parse::<Level>().unwrap(), Level::Info);
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn test_record_timestamp_keeps_microseconds() {
        let created = DateTime::from_timestamp(1_700_000_000, 250_000_000).unwrap();
        let record = LogRecord::new("app", Level::Info, "hi").with_created(created);
        assert!((record.timestamp() - 1_700_000_000.25).abs() < 1e-6);
    }
}
