//! Pool configuration and hooks.

use crate::errors::JobPoolError;
use crate::events::{EventLevel, EventSink};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Queue capacity used when the configured capacity is zero.
pub const DEFAULT_POOL_CAPACITY: usize = 10;

/// How long an extra worker waits for a job before it exits.
pub const DEFAULT_IDLE_LIFETIME_MS: u64 = 60_000;

/// Called with the payload and backtrace of a handler panic.
pub type PanicHandler = Arc<dyn Fn(&(dyn Any + Send), &Backtrace) + Send + Sync>;

/// Called once with the close reason after every worker has exited.
pub type ExitHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Sizing and logging settings for a [`Pool`](super::Pool).
///
/// Zero values for `capacity` and `max_active` mean "use the default".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of queued jobs before `add_job` blocks.
    pub capacity: usize,
    /// Upper bound on concurrently running workers.
    pub max_active: usize,
    /// Idle time after which an extra worker exits, in milliseconds.
    pub idle_lifetime_ms: u64,
    /// Minimum level of events forwarded to the event sink.
    pub event_level: EventLevel,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_POOL_CAPACITY,
            max_active: 0,
            idle_lifetime_ms: DEFAULT_IDLE_LIFETIME_MS,
            event_level: EventLevel::Debug,
        }
    }
}

impl PoolConfig {
    /// Creates a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the queue capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the maximum number of workers.
    #[must_use]
    pub const fn with_max_active(mut self, max_active: usize) -> Self {
        self.max_active = max_active;
        self
    }

    /// Sets the idle lifetime of extra workers.
    #[must_use]
    pub const fn with_idle_lifetime_ms(mut self, idle_lifetime_ms: u64) -> Self {
        self.idle_lifetime_ms = idle_lifetime_ms;
        self
    }

    /// Sets the minimum forwarded event level.
    #[must_use]
    pub const fn with_event_level(mut self, level: EventLevel) -> Self {
        self.event_level = level;
        self
    }

    /// Fills in defaults and checks the remaining values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the idle lifetime is zero.
    pub fn resolve(&self) -> Result<ResolvedConfig, JobPoolError> {
        if self.idle_lifetime_ms == 0 {
            return Err(JobPoolError::InvalidConfig(
                "idle_lifetime_ms must be greater than zero".to_string(),
            ));
        }
        let capacity = if self.capacity == 0 {
            DEFAULT_POOL_CAPACITY
        } else {
            self.capacity
        };
        let max_active = if self.max_active == 0 {
            (capacity / 2).max(1)
        } else {
            self.max_active
        };
        Ok(ResolvedConfig {
            capacity,
            max_active,
            idle_lifetime: Duration::from_millis(self.idle_lifetime_ms),
            event_level: self.event_level,
        })
    }
}

/// A [`PoolConfig`] with defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Queue capacity, never zero.
    pub capacity: usize,
    /// Worker ceiling, never zero.
    pub max_active: usize,
    /// Idle lifetime of extra workers.
    pub idle_lifetime: Duration,
    /// Minimum forwarded event level.
    pub event_level: EventLevel,
}

/// Optional callbacks a pool invokes.
#[derive(Clone, Default)]
pub struct PoolHooks {
    /// Receives events at or above the configured level.
    pub event_sink: Option<Arc<dyn EventSink>>,
    /// Receives recovered handler panics.
    pub panic_handler: Option<PanicHandler>,
    /// Receives the close reason once the pool has exited.
    pub exit_handler: Option<ExitHandler>,
}

impl PoolHooks {
    /// Creates an empty set of hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Sets the panic handler.
    #[must_use]
    pub fn with_panic_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&(dyn Any + Send), &Backtrace) + Send + Sync + 'static,
    {
        self.panic_handler = Some(Arc::new(handler));
        self
    }

    /// Sets the exit handler.
    #[must_use]
    pub fn with_exit_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.exit_handler = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for PoolHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolHooks")
            .field("event_sink", &self.event_sink.is_some())
            .field("panic_handler", &self.panic_handler.is_some())
            .field("exit_handler", &self.exit_handler.is_some())
            .finish()
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_resolve() {
        let resolved = PoolConfig::default().resolve().unwrap();
        assert_eq!(resolved.capacity, 10);
        assert_eq!(resolved.max_active, 5);
        assert_eq!(resolved.idle_lifetime, Duration::from_secs(60));
        assert_eq!(resolved.event_level, EventLevel::Debug);
    }

    #[test]
    fn test_zero_capacity_uses_default() {
        let resolved = PoolConfig::new().with_capacity(0).resolve().unwrap();
        assert_eq!(resolved.capacity, DEFAULT_POOL_CAPACITY);
    }

    #[test]
    fn test_max_active_at_least_one() {
        let resolved = PoolConfig::new().with_capacity(1).resolve().unwrap();
        assert_eq!(resolved.max_active, 1);
    }

    #[test]
    fn test_explicit_max_active_kept() {
        let resolved = PoolConfig::new()
            .with_capacity(4)
            .with_max_active(8)
            .resolve()
            .unwrap();
        assert_eq!(resolved.max_active, 8);
    }

    #[test]
    fn test_zero_idle_lifetime_rejected() {
        let err = PoolConfig::new()
            .with_idle_lifetime_ms(0)
            .resolve()
            .unwrap_err();
        assert!(matches!(err, JobPoolError::InvalidConfig(_)));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PoolConfig =
            serde_json::from_str(r#"{"capacity": 32, "event_level": "warning"}"#).unwrap();
        assert_eq!(config.capacity, 32);
        assert_eq!(config.max_active, 0);
        assert_eq!(config.idle_lifetime_ms, DEFAULT_IDLE_LIFETIME_MS);
        assert_eq!(config.event_level, EventLevel::Warning);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_hooks_debug() {
        let hooks = PoolHooks::new().with_exit_handler(|_reason| {});
        let debug = format!("{hooks:?}");
        assert!(debug.contains("exit_handler: true"));
        assert!(debug.contains("panic_handler: false"));
    }
}
