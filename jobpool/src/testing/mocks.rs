//! Handlers for exercising pools in tests and benchmarks.

use crate::job::JobHandler;
use parking_lot::{Condvar, Mutex};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A handler that counts its calls and returns a fixed value.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    value: Value,
    calls: AtomicUsize,
}

impl RecordingHandler {
    /// Creates a handler returning `null`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handler returning `value`.
    #[must_use]
    pub fn returning(value: Value) -> Self {
        Self {
            value,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of times the handler ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl JobHandler for RecordingHandler {
    fn handle(&self) -> anyhow::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.value.clone())
    }
}

/// A handler that always returns an error.
#[derive(Debug, Clone)]
pub struct FailingHandler {
    message: String,
}

impl FailingHandler {
    /// Creates a handler failing with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl JobHandler for FailingHandler {
    fn handle(&self) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!(self.message.clone()))
    }
}

/// A handler that always panics.
#[derive(Debug, Clone)]
pub struct PanickingHandler {
    message: String,
}

impl PanickingHandler {
    /// Creates a handler panicking with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl JobHandler for PanickingHandler {
    fn handle(&self) -> anyhow::Result<Value> {
        panic!("{}", self.message);
    }
}

/// A handler that sleeps before succeeding.
#[derive(Debug)]
pub struct SlowHandler {
    delay: Duration,
    calls: AtomicUsize,
}

impl SlowHandler {
    /// Creates a handler sleeping for `delay` on every call.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of times the handler ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl JobHandler for SlowHandler {
    fn handle(&self) -> anyhow::Result<Value> {
        thread::sleep(self.delay);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Null)
    }
}

/// A latch that holds handlers until it is opened.
#[derive(Debug, Default)]
pub struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
    waiting: AtomicUsize,
}

impl Gate {
    /// Creates a closed gate.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Opens the gate and releases every waiter.
    pub fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }

    /// Returns the number of handlers currently held.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    fn wait(&self) {
        let mut open = self.open.lock();
        if *open {
            return;
        }
        self.waiting.fetch_add(1, Ordering::SeqCst);
        while !*open {
            self.opened.wait(&mut open);
        }
        self.waiting.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A handler that blocks on a [`Gate`] and then succeeds.
#[derive(Debug)]
pub struct GatedHandler {
    gate: Arc<Gate>,
}

impl GatedHandler {
    /// Creates a handler held by `gate`.
    #[must_use]
    pub fn new(gate: &Arc<Gate>) -> Self {
        Self {
            gate: Arc::clone(gate),
        }
    }
}

impl JobHandler for GatedHandler {
    fn handle(&self) -> anyhow::Result<Value> {
        self.gate.wait();
        Ok(Value::Bool(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recording_handler() {
        let handler = RecordingHandler::returning(json!(7));
        assert_eq!(handler.handle().unwrap(), json!(7));
        assert_eq!(handler.handle().unwrap(), json!(7));
        assert_eq!(handler.call_count(), 2);
    }

    #[test]
    fn test_failing_handler() {
        let err = FailingHandler::new("disk full").handle().unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    #[should_panic(expected = "kaboom")]
    fn test_panicking_handler() {
        let _ = PanickingHandler::new("kaboom").handle();
    }

    #[test]
    fn test_gate_releases_waiters() {
        let gate = Gate::new();
        let handler = GatedHandler::new(&gate);
        let worker = thread::spawn(move || handler.handle().unwrap());

        let start = std::time::Instant::now();
        while gate.waiting() == 0 && start.elapsed() < Duration::from_secs(1) {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(gate.waiting(), 1);

        gate.open();
        assert_eq!(worker.join().unwrap(), json!(true));
        assert_eq!(gate.waiting(), 0);
    }
}
