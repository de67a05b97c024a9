//! Job handler trait and implementations.
//!
//! A handler is the unit of work a job carries. The pool calls
//! [`JobHandler::handle`] on a worker thread and records the outcome.

use serde_json::Value;
use std::fmt::Debug;

/// Trait for job handlers.
///
/// Returning `Err` marks the job as failed. A panic is caught by the pool and
/// recorded as a [`HandlerPanicError`](crate::errors::HandlerPanicError).
#[cfg_attr(test, mockall::automock)]
pub trait JobHandler: Send + Sync {
    /// Executes the job and returns its result value.
    fn handle(&self) -> anyhow::Result<Value>;
}

/// A simple function-based handler.
pub struct FnHandler<F>
where
    F: Fn() -> anyhow::Result<Value> + Send + Sync,
{
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn() -> anyhow::Result<Value> + Send + Sync,
{
    /// Creates a new function-based handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Debug for FnHandler<F>
where
    F: Fn() -> anyhow::Result<Value> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

impl<F> JobHandler for FnHandler<F>
where
    F: Fn() -> anyhow::Result<Value> + Send + Sync,
{
    fn handle(&self) -> anyhow::Result<Value> {
        (self.func)()
    }
}

/// A handler that does nothing and returns `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpHandler;

impl JobHandler for NoOpHandler {
    fn handle(&self) -> anyhow::Result<Value> {
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fn_handler() {
        let handler = FnHandler::new(|| Ok(json!({"rows": 3})));
        assert_eq!(handler.handle().unwrap(), json!({"rows": 3}));
    }

    #[test]
    fn test_fn_handler_error() {
        let handler = FnHandler::new(|| Err(anyhow::anyhow!("connection refused")));
        let err = handler.handle().unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn test_noop_handler() {
        assert_eq!(NoOpHandler.handle().unwrap(), Value::Null);
    }

    #[test]
    fn test_mock_handler() {
        let mut mock = MockJobHandler::new();
        mock.expect_handle().times(1).returning(|| Ok(json!("mocked")));

        assert_eq!(mock.handle().unwrap(), json!("mocked"));
    }
}
