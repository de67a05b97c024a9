//! Jobs and their dependency graph.
//!
//! - [`JobHandler`] is the work a job carries.
//! - [`JobGraph`] is the arena that owns jobs and the edges between them.
//! - [`JobRef`] is the shareable handle the pool and predicates work with.

mod graph;
mod handle;
mod handler;

pub use graph::{JobGraph, JobId, ReadyPredicate, ResultCallback};
pub use handle::{all_parents_succeeded, JobRef};
pub use handler::{FnHandler, JobHandler, NoOpHandler};

#[cfg(test)]
pub use handler::MockJobHandler;
