//! Event types, the event sink trait and its implementations.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a pool event, ordered `Debug < Info < Warning < Error`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Per-job bookkeeping: submissions, starts, finishes.
    #[default]
    Debug,
    /// Worker lifecycle and shutdown progress.
    Info,
    /// Something unexpected that the pool recovered from.
    Warning,
    /// A handler panicked.
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A single pool event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event severity.
    pub level: EventLevel,
    /// Human readable description.
    pub message: String,
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Creates a new event stamped with the current time.
    #[must_use]
    pub fn new(level: EventLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Trait for event sinks that receive pool events.
///
/// Sinks are called synchronously on the thread that emitted the event, which
/// is usually a worker. Slow sinks slow the pool down.
pub trait EventSink: Send + Sync {
    /// Receives one event.
    fn emit(&self, event: &Event);
}

/// An event sink backed by a closure.
pub struct FnEventSink<F>
where
    F: Fn(&Event) + Send + Sync,
{
    func: F,
}

impl<F> FnEventSink<F>
where
    F: Fn(&Event) + Send + Sync,
{
    /// Creates a new closure-backed sink.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> fmt::Debug for FnEventSink<F>
where
    F: Fn(&Event) + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEventSink").finish_non_exhaustive()
    }
}

impl<F> EventSink for FnEventSink<F>
where
    F: Fn(&Event) + Send + Sync,
{
    fn emit(&self, event: &Event) {
        (self.func)(event);
    }
}

/// A no-op event sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: &Event) {}
}

/// An event sink that writes events to `tracing` under a fixed target.
///
/// The pool already logs every event, so this sink is mostly useful for
/// routing sink-filtered events to a separate subscriber layer.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    label: String,
}

impl LoggingEventSink {
    /// Creates a sink whose records carry `label` as a field.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self::new("jobpool")
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event: &Event) {
        let label = self.label.as_str();
        let timestamp = event.timestamp.to_rfc3339();
        match event.level {
            EventLevel::Debug => {
                tracing::debug!(target: "jobpool::events", label, %timestamp, "{}", event.message);
            }
            EventLevel::Info => {
                tracing::info!(target: "jobpool::events", label, %timestamp, "{}", event.message);
            }
            EventLevel::Warning => {
                tracing::warn!(target: "jobpool::events", label, %timestamp, "{}", event.message);
            }
            EventLevel::Error => {
                tracing::error!(target: "jobpool::events", label, %timestamp, "{}", event.message);
            }
        }
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<Event>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events emitted at exactly `level`.
    #[must_use]
    pub fn events_at(&self, level: EventLevel) -> Vec<Event> {
        self.events
            .read()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    /// Returns true if any collected message contains `needle`.
    #[must_use]
    pub fn contains_message(&self, needle: &str) -> bool {
        self.events.read().iter().any(|e| e.message.contains(needle))
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: &Event) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_level_order() {
        assert!(EventLevel::Debug < EventLevel::Info);
        assert!(EventLevel::Info < EventLevel::Warning);
        assert!(EventLevel::Warning < EventLevel::Error);
    }

    #[test]
    fn test_event_display() {
        let event = Event::new(EventLevel::Warning, "queue full");
        assert_eq!(event.to_string(), "[WARNING] queue full");
    }

    #[test]
    fn test_event_serialize() {
        let event = Event::new(EventLevel::Error, "boom");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["message"], "boom");
    }

    #[test]
    fn test_fn_sink() {
        let count = AtomicUsize::new(0);
        let sink = FnEventSink::new(|_event: &Event| {
            count.fetch_add(1, Ordering::SeqCst);
        });
        sink.emit(&Event::new(EventLevel::Info, "one"));
        sink.emit(&Event::new(EventLevel::Info, "two"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_noop_and_logging_sinks_accept_all_levels() {
        let noop = NoOpEventSink;
        let logging = LoggingEventSink::default();
        for level in [
            EventLevel::Debug,
            EventLevel::Info,
            EventLevel::Warning,
            EventLevel::Error,
        ] {
            let event = Event::new(level, "msg");
            noop.emit(&event);
            logging.emit(&event);
        }
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(&Event::new(EventLevel::Debug, "job 'a' start"));
        sink.emit(&Event::new(EventLevel::Info, "worker '1' started"));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.events_at(EventLevel::Info).len(), 1);
        assert!(sink.contains_message("job 'a'"));

        sink.clear();
        assert!(sink.is_empty());
    }
}
