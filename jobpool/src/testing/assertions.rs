//! Test assertions for job state.

use crate::core::JobStatus;
use crate::job::JobRef;

/// Asserts that the job succeeded.
pub fn assert_job_succeeded(job: &JobRef) {
    assert!(
        job.status().is_success(),
        "Expected job '{}' to succeed, got status: {} ({:?})",
        job.name(),
        job.status(),
        job.error()
    );
}

/// Asserts that the job failed.
pub fn assert_job_failed(job: &JobRef) {
    assert_eq!(
        job.status(),
        JobStatus::Fail,
        "Expected job '{}' to fail, got status: {}",
        job.name(),
        job.status()
    );
}

/// Asserts that the job has the expected status.
pub fn assert_job_status(job: &JobRef, expected: JobStatus) {
    assert_eq!(
        job.status(),
        expected,
        "Expected job '{}' to be {}, got {}",
        job.name(),
        expected,
        job.status()
    );
}

/// Asserts that the job's result value equals `expected`.
pub fn assert_job_value(job: &JobRef, expected: &serde_json::Value) {
    match job.result() {
        Some(Ok(actual)) => assert_eq!(
            &actual,
            expected,
            "Unexpected result for job '{}'",
            job.name()
        ),
        other => panic!(
            "Expected job '{}' to produce {expected}, got {other:?}",
            job.name()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobGraph, NoOpHandler};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_pending_job_status() {
        let job = JobRef::standalone("idle", Arc::new(NoOpHandler));
        assert_job_status(&job, JobStatus::Pending);
    }

    #[test]
    #[should_panic(expected = "Expected job 'idle' to succeed")]
    fn test_assert_succeeded_on_pending_job() {
        let job = JobRef::standalone("idle", Arc::new(NoOpHandler));
        assert_job_succeeded(&job);
    }

    #[test]
    fn test_finished_job_assertions() {
        let mut graph = JobGraph::new();
        let id = graph.add_job("done", Arc::new(NoOpHandler));
        let graph = Arc::new(graph);
        let job = graph.job(id).unwrap();
        job.node().set_outcome(Ok(json!({"ok": true})));

        assert_job_succeeded(&job);
        assert_job_value(&job, &json!({"ok": true}));
    }
}
