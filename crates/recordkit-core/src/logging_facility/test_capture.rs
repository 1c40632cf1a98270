//! In-memory capture of boundary events for log assertions in tests.
//!
//! The capture layer is installed once as the global subscriber. Tests run in
//! parallel against the same buffer, so assertions are scoped to an
//! operation and, where needed, to a record type name unique to the test.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use recordkit_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_COMPONENT, FIELD_DURATION_MS, FIELD_ERR_CODE,
    FIELD_EVENT, FIELD_OP, FIELD_RECORD,
};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One captured event, all fields rendered as strings
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub component: Option<String>,
    pub op: Option<String>,
    pub event: Option<String>,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn from_fields(level: Level, fields: HashMap<String, String>) -> Self {
        Self {
            level,
            component: fields.get(FIELD_COMPONENT).cloned(),
            op: fields.get(FIELD_OP).cloned(),
            event: fields.get(FIELD_EVENT).cloned(),
            fields,
        }
    }

    /// Value of an arbitrary field, if it was recorded
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn is(&self, op: &str, event: &str) -> bool {
        self.op.as_deref() == Some(op) && self.event.as_deref() == Some(event)
    }

    /// Record type the event was emitted for
    pub fn record(&self) -> Option<&str> {
        self.field(FIELD_RECORD)
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.field(FIELD_DURATION_MS)?.parse().ok()
    }
}

/// Start/end/error tally of one operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundaryCounts {
    pub starts: usize,
    pub ends: usize,
    pub errors: usize,
}

impl BoundaryCounts {
    /// Exactly one start closed by exactly one end or error
    pub fn is_single_call(&self) -> bool {
        self.starts == 1 && self.ends + self.errors == 1
    }
}

#[derive(Default)]
struct FieldVisitor {
    fields: HashMap<String, String>,
}

impl FieldVisitor {
    fn put(&mut self, field: &Field, value: String) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }
}

/// Subscriber layer appending every event to a shared buffer
pub struct TestCaptureLayer {
    buffer: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> Layer<S> for TestCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let captured = CapturedEvent::from_fields(*event.metadata().level(), visitor.fields);

        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.push(captured);
        }
    }
}

/// Read handle onto the captured events
#[derive(Clone)]
pub struct TestCapture {
    buffer: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    /// Create a layer and the handle reading what it captures
    pub fn pair() -> (TestCaptureLayer, TestCapture) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let layer = TestCaptureLayer {
            buffer: Arc::clone(&buffer),
        };
        (layer, TestCapture { buffer })
    }

    /// Snapshot of every captured event
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.buffer
            .lock()
            .map(|buffer| buffer.clone())
            .unwrap_or_default()
    }

    /// Events of one operation, in emission order
    pub fn events_for(&self, op: &str) -> Vec<CapturedEvent> {
        self.select(|e| e.op.as_deref() == Some(op))
    }

    /// Events of one operation emitted for one record type
    pub fn events_for_record(&self, op: &str, record: &str) -> Vec<CapturedEvent> {
        self.select(|e| e.op.as_deref() == Some(op) && e.record() == Some(record))
    }

    /// Tally start, end and error events of one operation on one record type
    pub fn boundary_counts(&self, op: &str, record: &str) -> BoundaryCounts {
        self.events_for_record(op, record)
            .iter()
            .fold(BoundaryCounts::default(), |mut counts, e| {
                match e.event.as_deref() {
                    Some(EVENT_START) => counts.starts += 1,
                    Some(EVENT_END) => counts.ends += 1,
                    Some(EVENT_END_ERROR) => counts.errors += 1,
                    _ => {}
                }
                counts
            })
    }

    /// Error code of the last failure of `op` on `record`
    pub fn last_error_code(&self, op: &str, record: &str) -> Option<String> {
        self.events_for_record(op, record)
            .iter()
            .rev()
            .find(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
            .and_then(|e| e.field(FIELD_ERR_CODE).map(str::to_string))
    }

    /// Assert that an event exists with the given operation and event type
    ///
    /// # Panics
    ///
    /// Panics if the event is not found
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let events = self.events();
        assert!(
            events.iter().any(|e| e.is(op, event)),
            "Expected event op={} event={} not found in {} captured events",
            op,
            event,
            events.len()
        );
    }

    /// Count events matching a predicate
    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    fn select<F>(&self, keep: F) -> Vec<CapturedEvent>
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().into_iter().filter(|e| keep(e)).collect()
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer (first call only) and return the shared handle
///
/// # Example
///
/// ```
/// use recordkit_core::logging_facility::test_capture::init_test_capture;
/// use recordkit_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("my_operation", record = "Probe");
/// assert_eq!(capture.boundary_counts("my_operation", "Probe").starts, 1);
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let (layer, capture) = TestCapture::pair();
            let _ = tracing_subscriber::registry().with(layer).try_init();
            capture
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(op: &str, event: &str, record: &str) -> CapturedEvent {
        let mut fields = HashMap::new();
        fields.insert(FIELD_OP.to_string(), op.to_string());
        fields.insert(FIELD_EVENT.to_string(), event.to_string());
        fields.insert(FIELD_RECORD.to_string(), record.to_string());
        fields.insert(FIELD_DURATION_MS.to_string(), "4".to_string());
        CapturedEvent::from_fields(Level::INFO, fields)
    }

    #[test]
    fn test_canonical_fields_are_lifted() {
        let captured = event("record_set", EVENT_END, "Point");
        assert!(captured.is("record_set", EVENT_END));
        assert_eq!(captured.record(), Some("Point"));
        assert_eq!(captured.duration_ms(), Some(4));
        assert_eq!(captured.field("missing"), None);
    }

    #[test]
    fn test_boundary_counts_per_record() {
        let (_layer, capture) = TestCapture::pair();
        if let Ok(mut buffer) = capture.buffer.lock() {
            buffer.push(event("record_diff", EVENT_START, "A"));
            buffer.push(event("record_diff", EVENT_END, "A"));
            buffer.push(event("record_diff", EVENT_START, "B"));
            buffer.push(event("record_diff", EVENT_END_ERROR, "B"));
        }

        assert!(capture.boundary_counts("record_diff", "A").is_single_call());
        let b = capture.boundary_counts("record_diff", "B");
        assert_eq!(b, BoundaryCounts { starts: 1, ends: 0, errors: 1 });
        assert!(b.is_single_call());
        assert_eq!(capture.boundary_counts("record_set", "A"), BoundaryCounts::default());
    }
}
