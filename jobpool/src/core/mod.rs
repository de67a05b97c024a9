//! Core domain model types for jobpool.
//!
//! This module contains the fundamental types shared by jobs, pipelines and
//! the pool:
//! - Job and pool status enums
//! - The outcome recorded when a job handler finishes

mod status;

pub use status::{JobStatus, PoolStatus};

use crate::errors::JobFailure;

/// The outcome of running a job handler.
pub type JobOutcome = Result<serde_json::Value, JobFailure>;
