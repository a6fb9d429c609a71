//! Log sinks and the request-scoped [`Logger`].
//!
//! A [`LogSink`] is the structured-logging backend: it receives a level, a
//! message and a field map and writes them somewhere. The sink is injected
//! once, into [`RequestLogger::new`](super::RequestLogger::new); each request
//! gets a [`Logger`] that shares the sink and carries the request's
//! persistent fields (its `correlation_id`).

use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tracing::Level;

/// One structured log event.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub level: Level,
    pub message: String,
    pub fields: Map<String, Value>,
}

/// A structured-logging backend.
pub trait LogSink: Send + Sync + 'static {
    fn emit(&self, record: Record);
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn emit(&self, record: Record) {
        (**self).emit(record)
    }
}

// ── TracingSink ───────────────────────────────────────────────────────────────

/// Forwards records to `tracing` under the `reqlog` target.
///
/// The field map is rendered as one JSON value in the event's `fields` field,
/// so nesting survives whichever subscriber formats it.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: Record) {
        let fields = Value::Object(record.fields);
        let message = record.message.as_str();

        // `tracing` needs the level as a constant at each call site.
        macro_rules! event_at {
            ($level:expr) => {
                tracing::event!(target: "reqlog", $level, fields = %fields, "{}", message)
            };
        }

        match record.level {
            Level::ERROR => event_at!(Level::ERROR),
            Level::WARN  => event_at!(Level::WARN),
            Level::INFO  => event_at!(Level::INFO),
            Level::DEBUG => event_at!(Level::DEBUG),
            _            => event_at!(Level::TRACE),
        }
    }
}

// ── MemorySink ────────────────────────────────────────────────────────────────

/// Keeps every record in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of the records emitted so far.
    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: Record) {
        // A poisoned lock still holds complete records.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }
}

// ── Logger ────────────────────────────────────────────────────────────────────

/// A cheap handle over a shared [`LogSink`] plus a set of persistent fields
/// added to every record it emits.
///
/// ```rust
/// use std::sync::Arc;
/// use reqlog::middleware::{Logger, MemorySink};
/// use serde_json::Map;
///
/// let sink = Arc::new(MemorySink::new());
/// let logger = Logger::new(Arc::clone(&sink)).with_field("correlation_id", "abc");
/// logger.info("hello", Map::new());
///
/// assert_eq!(sink.records()[0].fields["correlation_id"], "abc");
/// ```
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    context: Map<String, Value>,
}

impl Logger {
    pub fn new(sink: impl LogSink) -> Self {
        Self { sink: Arc::new(sink), context: Map::new() }
    }

    /// Returns a logger that also attaches `key = value` to every record.
    pub fn with_field(&self, key: &str, value: impl Into<Value>) -> Self {
        let mut context = self.context.clone();
        context.insert(key.to_owned(), value.into());
        Self { sink: Arc::clone(&self.sink), context }
    }

    /// Persistent fields.
    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    /// Emits `fields` merged over the persistent fields.
    pub fn log(&self, level: Level, message: &str, fields: Map<String, Value>) {
        let mut merged = self.context.clone();
        merged.extend(fields);
        self.sink.emit(Record { level, message: message.to_owned(), fields: merged });
    }

    pub fn info(&self, message: &str, fields: Map<String, Value>) {
        self.log(Level::INFO, message, fields)
    }

    pub fn warn(&self, message: &str, fields: Map<String, Value>) {
        self.log(Level::WARN, message, fields)
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("context", &self.context).finish_non_exhaustive()
    }
}
