//! `tracing` integration: a [`Layer`] that ships events to Graylog.
//!
//! `on_event` runs synchronously inside the caller, so records are queued
//! on a channel and emitted by a [`GelfWorker`] on the tokio runtime.

use crate::core::handler::GelfHandler;
use crate::core::{Level, LogRecord};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Crates that log while a record is being sent.
const TRANSPORT_TARGETS: &[&str] = &[
    "h2",
    "hyper",
    "hyper_util",
    "reqwest",
    "rustls",
    "tokio_rustls",
    "tower",
    "want",
];

fn is_target_of(target: &str, krate: &str) -> bool {
    target == krate
        || target
            .strip_prefix(krate)
            .is_some_and(|rest| rest.starts_with("::"))
}

/// Events raised while shipping a record must not become records
/// themselves, or every send would trigger another one.
fn is_shipping_target(target: &str) -> bool {
    is_target_of(target, OWN_TARGET)
        || TRANSPORT_TARGETS
            .iter()
            .any(|krate| is_target_of(target, krate))
}

#[derive(Clone)]
pub struct GelfLayer {
    sender: mpsc::UnboundedSender<LogRecord>,
    closed: Arc<AtomicBool>,
}

pub struct GelfWorker {
    receiver: mpsc::UnboundedReceiver<LogRecord>,
    handler: GelfHandler,
}

impl GelfLayer {
    pub fn new(handler: GelfHandler) -> (Self, GelfWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let layer = Self {
            sender,
            closed: Arc::new(AtomicBool::new(false)),
        };
        (layer, GelfWorker { receiver, handler })
    }
}

impl GelfWorker {
    /// Emits queued records until every [`GelfLayer`] clone is dropped.
    pub async fn run(mut self) {
        while let Some(record) = self.receiver.recv().await {
            if let Err(e) = self.handler.emit(&record).await {
                tracing::debug!(
                    "Failed to emit GELF record via {}: {}",
                    self.handler.transport_name(),
                    e
                );
            }
        }
        tracing::debug!("GELF worker stopped, all layers dropped");
    }
}

impl<S: Subscriber> Layer<S> for GelfLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_shipping_target(metadata.target()) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let mut record = LogRecord::new(
            metadata.target(),
            Level::from(metadata.level()),
            visitor.message.unwrap_or_default(),
        );
        record.pathname = metadata.file().map(str::to_string);
        record.lineno = metadata.line();
        record.func_name = metadata.module_path().map(str::to_string);
        record.exc_text = visitor.exc_text;
        record.extra = visitor.fields;

        // worker 已停止：丟棄紀錄，只提示一次
        if self.sender.send(record).is_err() && !self.closed.swap(true, Ordering::Relaxed) {
            tracing::debug!("GELF worker stopped, dropping records from now on");
        }
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    exc_text: Option<String>,
    fields: Map<String, Value>,
}

impl RecordVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for RecordVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let mut text = value.to_string();
        let mut source = value.source();
        while let Some(cause) = source {
            text.push_str("\nCaused by: ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        self.fields
            .insert(field.name().to_string(), Value::from(value.to_string()));
        self.exc_text = Some(text);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{:?}", value)));
    }
}
