//! JSONL event layer.
//!
//! One object per event:
//!
//! ```json
//! {"ts":"2026-01-15T10:30:00.123Z","level":"INFO","service":"roomlog","pid":4242,
//!  "target":"room_worker::backfill","room":"xkcd","message":"Backfill finished",
//!  "fields":{"completion":"Overlap","rows":100}}
//! ```
//!
//! `room` and `global_id` are lifted out of the event fields so a fleet log can
//! be filtered per room without digging into `fields`.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Fields promoted to top-level keys.
const ROOM_FIELD: &str = "room";
const GLOBAL_ID_FIELD: &str = "global_id";

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub ts: String,
    pub level: &'static str,
    pub service: String,
    pub pid: u32,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_id: Option<String>,
    pub message: String,
    /// Remaining event fields, in name order.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Default)]
struct EventFields {
    message: String,
    room: Option<String>,
    global_id: Option<String>,
    rest: BTreeMap<String, Value>,
}

impl EventFields {
    fn put(&mut self, field: &Field, value: Value) {
        match (field.name(), value) {
            ("message", Value::String(text)) => self.message = text,
            (ROOM_FIELD, Value::String(room)) => self.room = Some(room),
            (GLOBAL_ID_FIELD, Value::String(id)) => self.global_id = Some(id),
            (name, value) => {
                self.rest.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for EventFields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON number form.
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.put(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, Value::String(value.to_string()));
    }
}

/// Layer writing one [`LogEntry`] line per event to `make_writer`.
pub struct JsonLayer<W> {
    service: String,
    pid: u32,
    make_writer: W,
}

impl<W> JsonLayer<W> {
    pub fn new(service: impl Into<String>, make_writer: W) -> Self {
        Self {
            service: service.into(),
            pid: std::process::id(),
            make_writer,
        }
    }

    fn entry(&self, event: &Event<'_>) -> LogEntry {
        let mut fields = EventFields::default();
        event.record(&mut fields);
        let metadata = event.metadata();

        LogEntry {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: metadata.level().as_str(),
            service: self.service.clone(),
            pid: self.pid,
            target: metadata.target().to_string(),
            room: fields.room,
            global_id: fields.global_id,
            message: fields.message,
            fields: fields.rest,
        }
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let Ok(line) = serde_json::to_string(&self.entry(event)) else {
            return;
        };
        let mut writer = self.make_writer.make_writer();
        let _ = writeln!(writer, "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(emit: impl FnOnce()) -> Vec<Value> {
        let sink = Capture::default();
        let subscriber =
            tracing_subscriber::registry().with(JsonLayer::new("roomlog", sink.clone()));
        tracing::subscriber::with_default(subscriber, emit);

        let out = String::from_utf8(sink.0.lock().clone()).unwrap();
        out.lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_room_and_global_id_are_top_level() {
        let lines = capture(|| {
            tracing::debug!(room = %"xkcd", global_id = %"xkcdabc", "Live message already stored");
        });

        assert_eq!(lines.len(), 1);
        let entry = &lines[0];
        assert_eq!(entry["level"], "DEBUG");
        assert_eq!(entry["service"], "roomlog");
        assert_eq!(entry["room"], "xkcd");
        assert_eq!(entry["global_id"], "xkcdabc");
        assert_eq!(entry["message"], "Live message already stored");
        assert!(entry.get("fields").is_none());
    }

    #[test]
    fn test_remaining_fields_keep_their_types() {
        let lines = capture(|| {
            tracing::info!(room = "xkcd", rows = 100u64, live = 2i64, done = true, "Backfill finished");
            tracing::warn!(delay = f64::NAN, "Session ended, reconnecting");
        });

        assert_eq!(lines[0]["fields"]["rows"], 100);
        assert_eq!(lines[0]["fields"]["live"], 2);
        assert_eq!(lines[0]["fields"]["done"], true);
        assert!(lines[0]["fields"].get("room").is_none());
        assert_eq!(lines[1]["fields"]["delay"], "NaN");
        assert!(lines[1].get("room").is_none());
    }
}
