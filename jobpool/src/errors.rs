//! Error types for the jobpool crate.
//!
//! Graph construction errors ([`DuplicateEdgeError`], [`CycleDetectedError`],
//! [`NoRootJobsError`]) are returned synchronously when an edge is declared or
//! a pipeline is built. Pool errors ([`PoolClosedError`]) are returned by
//! submission and shutdown. Handler failures never surface here: they are
//! recorded on the job as a [`JobFailure`].

use std::sync::Arc;
use thiserror::Error;

/// The main error type for jobpool operations.
#[derive(Debug, Clone, Error)]
pub enum JobPoolError {
    /// An edge would duplicate an existing one or point a job at itself.
    #[error("{0}")]
    DuplicateEdge(#[from] DuplicateEdgeError),

    /// An edge would introduce a cycle, or the graph already has one.
    #[error("{0}")]
    CycleDetected(#[from] CycleDetectedError),

    /// A pipeline has no job without parents.
    #[error("{0}")]
    NoRootJobs(#[from] NoRootJobsError),

    /// The pool is exiting or has exited.
    #[error("{0}")]
    PoolClosed(#[from] PoolClosedError),

    /// A job id does not belong to the graph it was used with.
    #[error("Unknown job id {0}")]
    UnknownJob(usize),

    /// A pool or logging configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The operating system refused to start a worker thread.
    #[error("Failed to spawn worker: {0}")]
    WorkerSpawn(String),
}

/// Error raised when an edge joins a job to itself or repeats an existing edge.
///
/// Jobs are compared by name, so two distinct jobs that share a name count as
/// the same job here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Job '{other}' duplicate added to '{job}'")]
pub struct DuplicateEdgeError {
    /// The job the edge was declared on.
    pub job: String,
    /// The job on the other end of the edge.
    pub other: String,
}

impl DuplicateEdgeError {
    /// Creates a new duplicate edge error.
    #[must_use]
    pub fn new(job: impl Into<String>, other: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            other: other.into(),
        }
    }
}

/// Error raised when a cycle is detected in a job graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cycle detected: {}", cycle_path.join(" -> "))]
pub struct CycleDetectedError {
    /// The job names forming the cycle, first and last being the same job.
    pub cycle_path: Vec<String>,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(cycle_path: Vec<String>) -> Self {
        Self { cycle_path }
    }
}

/// Error raised when a pipeline has no root jobs.
///
/// Either no jobs were given, or every member has a parent, which can only
/// happen when the members' ancestry lies outside the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Pipeline '{pipeline}' has no root jobs")]
pub struct NoRootJobsError {
    /// The pipeline name.
    pub pipeline: String,
}

impl NoRootJobsError {
    /// Creates a new no root jobs error.
    #[must_use]
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
        }
    }
}

/// Error raised when submitting to or closing a pool that is exiting or exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Error)]
#[error("Pool exit")]
pub struct PoolClosedError;

/// Sentinel recorded as a job's failure when its handler panics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Job '{job}' panicked: {message}")]
pub struct HandlerPanicError {
    /// The job whose handler panicked.
    pub job: String,
    /// The panic payload rendered as text.
    pub message: String,
}

impl HandlerPanicError {
    /// Creates a new handler panic error.
    #[must_use]
    pub fn new(job: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            message: message.into(),
        }
    }
}

/// The failure recorded on a job whose handler did not succeed.
#[derive(Debug, Clone, Error)]
pub enum JobFailure {
    /// The handler returned an error.
    #[error("{0}")]
    Handler(Arc<anyhow::Error>),

    /// The handler panicked.
    #[error(transparent)]
    Panicked(#[from] HandlerPanicError),
}

impl JobFailure {
    /// Returns true if the failure came from a handler panic.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

impl From<anyhow::Error> for JobFailure {
    fn from(err: anyhow::Error) -> Self {
        Self::Handler(Arc::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_detected_error() {
        let err = CycleDetectedError::new(vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "a".to_string(),
        ]);

        assert!(err.to_string().contains("a -> b -> c -> a"));
    }

    #[test]
    fn test_duplicate_edge_error_message() {
        let err = DuplicateEdgeError::new("build", "fetch");
        assert_eq!(err.to_string(), "Job 'fetch' duplicate added to 'build'");
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: JobPoolError = NoRootJobsError::new("nightly").into();
        assert!(matches!(err, JobPoolError::NoRootJobs(_)));
        assert_eq!(err.to_string(), "Pipeline 'nightly' has no root jobs");

        let err: JobPoolError = PoolClosedError.into();
        assert_eq!(err.to_string(), "Pool exit");
    }

    #[test]
    fn test_job_failure_from_anyhow() {
        let failure: JobFailure = anyhow::anyhow!("disk full").into();
        assert!(!failure.is_panic());
        assert_eq!(failure.to_string(), "disk full");

        let failure: JobFailure = HandlerPanicError::new("job", "boom").into();
        assert!(failure.is_panic());
        assert_eq!(failure.to_string(), "Job 'job' panicked: boom");
    }
}
