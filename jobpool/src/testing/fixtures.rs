//! Test fixtures: graph builders, polling and log setup.

use crate::job::{JobGraph, JobHandler, JobId};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Polls `condition` every millisecond until it holds or `timeout` passes.
///
/// Returns the final value of `condition`.
pub fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Installs a test-writer subscriber once; later calls are no-ops.
///
/// Honors `JOBPOOL_LOG`, defaulting to `warn` so test output stays quiet.
pub fn init_test_tracing() {
    let filter = std::env::var(crate::observability::LOG_ENV_VAR)
        .unwrap_or_else(|_| "warn".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_test_writer()
        .with_thread_names(true)
        .try_init();
}

/// Adds `len` jobs named `{prefix}0..` to `graph`, each depending on the
/// previous one, and returns their ids in order.
///
/// # Errors
///
/// Propagates edge errors, which only occur if `prefix` collides with
/// existing job names.
pub fn chain(
    graph: &mut JobGraph,
    prefix: &str,
    len: usize,
    handler: &Arc<dyn JobHandler>,
) -> Result<Vec<JobId>, crate::errors::JobPoolError> {
    let mut ids: Vec<JobId> = Vec::with_capacity(len);
    for i in 0..len {
        let id = graph.add_job(format!("{prefix}{i}"), Arc::clone(handler));
        if let Some(&previous) = ids.last() {
            graph.after(id, &[previous])?;
        }
        ids.push(id);
    }
    Ok(ids)
}

/// Adds one root fanning out to `width` middle jobs that all feed one sink,
/// returning `(root, middle, sink)`.
///
/// # Errors
///
/// Propagates edge errors, which only occur on name collisions.
pub fn fan_out_fan_in(
    graph: &mut JobGraph,
    width: usize,
    handler: &Arc<dyn JobHandler>,
    sink: Arc<dyn JobHandler>,
) -> Result<(JobId, Vec<JobId>, JobId), crate::errors::JobPoolError> {
    let root = graph.add_job("root", Arc::clone(handler));
    let middle: Vec<JobId> = (0..width)
        .map(|i| graph.add_job(format!("mid{i}"), Arc::clone(handler)))
        .collect();
    let sink = graph.add_job("sink", sink);
    graph.before(root, &middle)?;
    graph.after(sink, &middle)?;
    Ok((root, middle, sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::NoOpHandler;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_wait_until() {
        let calls = AtomicUsize::new(0);
        assert!(wait_until(Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst) >= 3
        }));
        assert!(!wait_until(Duration::from_millis(5), || false));
    }

    #[test]
    fn test_chain() {
        let handler: Arc<dyn JobHandler> = Arc::new(NoOpHandler);
        let mut graph = JobGraph::new();
        let ids = chain(&mut graph, "step", 3, &handler).unwrap();

        assert_eq!(ids.len(), 3);
        assert!(graph.parents(ids[0]).is_empty());
        assert_eq!(graph.parents(ids[2]), &[ids[1]]);
    }

    #[test]
    fn test_fan_out_fan_in() {
        let handler: Arc<dyn JobHandler> = Arc::new(NoOpHandler);
        let mut graph = JobGraph::new();
        let (root, middle, sink) =
            fan_out_fan_in(&mut graph, 4, &handler, Arc::new(NoOpHandler)).unwrap();

        assert_eq!(graph.children(root), middle.as_slice());
        assert_eq!(graph.parents(sink), middle.as_slice());
    }
}
