//! Job and pool status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The execution status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job has not run yet.
    #[default]
    Pending,
    /// Job handler is currently executing.
    Running,
    /// Job handler returned a value.
    Success,
    /// Job handler returned an error or panicked.
    Fail,
    /// Job was cancelled and will be skipped when dequeued.
    Cancelled,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Fail => write!(f, "fail"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl JobStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Fail | Self::Cancelled)
    }

    /// Returns true if the status indicates success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// The lifecycle status of a pool.
///
/// Transitions only go forward: `Running -> Exiting -> Exited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
    /// Pool accepts and executes jobs.
    #[default]
    Running,
    /// Pool is draining; new submissions are rejected.
    Exiting,
    /// Pool has shut down; all workers are gone.
    Exited,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Exiting => write!(f, "exiting"),
            Self::Exited => write!(f, "exited"),
        }
    }
}

impl PoolStatus {
    /// Returns true if the pool no longer accepts work.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Exiting | Self::Exited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_display() {
        assert_eq!(JobStatus::Pending.to_string(), "pending");
        assert_eq!(JobStatus::Success.to_string(), "success");
        assert_eq!(JobStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_job_status_is_terminal() {
        assert!(JobStatus::Success.is_terminal());
        assert!(JobStatus::Fail.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn test_job_status_serialize() {
        let json = serde_json::to_string(&JobStatus::Cancelled).unwrap();
        assert_eq!(json, r#""cancelled""#);

        let deserialized: JobStatus = serde_json::from_str(r#""fail""#).unwrap();
        assert_eq!(deserialized, JobStatus::Fail);
    }

    #[test]
    fn test_pool_status_order() {
        assert!(PoolStatus::Running < PoolStatus::Exiting);
        assert!(PoolStatus::Exiting < PoolStatus::Exited);
        assert!(!PoolStatus::Running.is_closed());
        assert!(PoolStatus::Exiting.is_closed());
        assert!(PoolStatus::Exited.is_closed());
    }
}
