//! Pool event system.
//!
//! Every pool event is logged through `tracing` at the matching level and,
//! when a sink is configured, forwarded to it if the event's level is at
//! least the configured minimum.

mod sink;

pub use sink::{
    CollectingEventSink, Event, EventLevel, EventSink, FnEventSink, LoggingEventSink,
    NoOpEventSink,
};

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Fans pool events out to tracing and to the user's sink.
#[derive(Clone)]
pub(crate) struct EventEmitter {
    pool_id: String,
    min_level: EventLevel,
    sink: Option<Arc<dyn EventSink>>,
}

impl EventEmitter {
    pub(crate) fn new(
        pool_id: impl Into<String>,
        min_level: EventLevel,
        sink: Option<Arc<dyn EventSink>>,
    ) -> Self {
        Self {
            pool_id: pool_id.into(),
            min_level,
            sink,
        }
    }

    pub(crate) fn emit(&self, level: EventLevel, message: impl Into<String>) {
        let message = message.into();
        let pool = self.pool_id.as_str();
        match level {
            EventLevel::Debug => debug!(pool, "{message}"),
            EventLevel::Info => info!(pool, "{message}"),
            EventLevel::Warning => warn!(pool, "{message}"),
            EventLevel::Error => error!(pool, "{message}"),
        }

        if let Some(sink) = &self.sink {
            if level >= self.min_level {
                sink.emit(&Event::new(level, message));
            }
        }
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("pool_id", &self.pool_id)
            .field("min_level", &self.min_level)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_emit_filters_below_min_level() {
        let sink = Arc::new(CollectingEventSink::new());
        let emitter = EventEmitter::new("pool-1", EventLevel::Info, Some(sink.clone()));

        emitter.emit(EventLevel::Debug, "job 'a' start");
        emitter.emit(EventLevel::Info, "worker started");
        emitter.emit(EventLevel::Error, "job 'b' panicked");

        let messages: Vec<String> = sink.events().iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec!["[INFO] worker started", "[ERROR] job 'b' panicked"]
        );
    }

    #[test]
    fn test_emit_without_sink() {
        let emitter = EventEmitter::new("pool-1", EventLevel::Debug, None);
        emitter.emit(EventLevel::Warning, "nobody listens");
    }
}
