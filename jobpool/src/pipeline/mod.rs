//! Pipelines: validated groups of dependent jobs.
//!
//! A pipeline checks once that its jobs form a DAG, then hands its roots to a
//! [`Pool`](crate::pool::Pool). Ordering emerges from the pool only enqueuing
//! jobs that are ready.

mod dag;

pub use dag::Pipeline;
