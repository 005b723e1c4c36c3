use serde_json::Value;
use tracing::info;

/// Product event sink, passed explicitly to the services that emit events.
///
/// Implementations can forward to any analytics provider; nothing in the
/// domain code assumes a global instance.
pub trait EventTracker: Send + Sync {
    fn track_event(&self, name: &str, properties: Value);
}

/// Default tracker: structured log lines through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingEventTracker;

impl EventTracker for TracingEventTracker {
    fn track_event(&self, name: &str, properties: Value) {
        info!(event_name = name, properties = %properties, "analytics event");
    }
}

/// Discards every event. Used in tests.
#[derive(Debug, Clone, Default)]
pub struct NoopEventTracker;

impl EventTracker for NoopEventTracker {
    fn track_event(&self, _name: &str, _properties: Value) {}
}
