//! Testing utilities for job graphs and pools.
//!
//! This module provides:
//! - Handlers that record, fail, panic, sleep or block on a gate
//! - Assertions on job status and results
//! - Graph builders, a polling helper and test log setup

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_job_failed, assert_job_status, assert_job_succeeded, assert_job_value};
pub use fixtures::{chain, fan_out_fan_in, init_test_tracing, wait_until};
pub use mocks::{
    FailingHandler, Gate, GatedHandler, PanickingHandler, RecordingHandler, SlowHandler,
};
