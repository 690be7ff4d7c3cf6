//! JSONL layer for the relay log file.
//!
//! Each event becomes one object with `timestamp`, `level`, `service`, `pid`,
//! `target`, `message` and the remaining structured fields under `fields`.
//! A `category` field (set on every presenter notification) is lifted to a
//! top-level `tip` key so notifications can be grepped without parsing
//! `fields`. Credential fields never reach the file.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Field carrying the notification category of a presenter tip.
const TIP_FIELD: &str = "category";

const REDACTED_FIELDS: [&str; 4] = ["password", "pwd", "__token__", "cookie"];

#[derive(Default)]
struct EventFields {
    message: Option<String>,
    tip: Option<String>,
    fields: Map<String, Value>,
}

impl EventFields {
    fn insert(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if REDACTED_FIELDS.iter().any(|r| name.eq_ignore_ascii_case(r)) {
            self.fields
                .insert(name.to_string(), Value::String("<redacted>".into()));
            return;
        }
        match (name, value) {
            ("message", Value::String(text)) => self.message = Some(text),
            (TIP_FIELD, Value::String(text)) => self.tip = Some(text),
            (_, value) => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for EventFields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.insert(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }
}

/// Layer writing each event as a single JSONL line.
pub(crate) struct JsonLayer<W> {
    service_name: String,
    pid: u32,
    make_writer: W,
}

impl<W> JsonLayer<W> {
    pub(crate) fn new(service_name: String, make_writer: W) -> Self {
        Self {
            service_name,
            pid: std::process::id(),
            make_writer,
        }
    }

    fn render(&self, event: &Event<'_>) -> Value {
        let mut recorded = EventFields::default();
        event.record(&mut recorded);
        let metadata = event.metadata();

        let mut line = Map::new();
        line.insert(
            "timestamp".into(),
            Utc::now()
                .to_rfc3339_opts(SecondsFormat::Micros, true)
                .into(),
        );
        line.insert("level".into(), metadata.level().as_str().into());
        line.insert("service".into(), self.service_name.clone().into());
        line.insert("pid".into(), self.pid.into());
        line.insert("target".into(), metadata.target().into());
        line.insert(
            "message".into(),
            recorded.message.unwrap_or_default().into(),
        );
        if let Some(tip) = recorded.tip {
            line.insert("tip".into(), tip.into());
        }
        if !recorded.fields.is_empty() {
            line.insert("fields".into(), Value::Object(recorded.fields));
        }
        Value::Object(line)
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let line = self.render(event);
        let mut writer = self.make_writer.make_writer();
        let _ = writeln!(writer, "{line}");
    }
}
