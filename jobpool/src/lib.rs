//! # Jobpool
//!
//! An in-process worker pool that runs dependency graphs of jobs.
//!
//! Jobpool provides:
//!
//! - **Job graphs**: declare `after`/`before` edges between jobs, with cycles
//!   rejected as each edge is added
//! - **Readiness predicates**: gate a job on its parents' outcomes with `when`
//! - **Pipelines**: validated DAGs with a root set, a reachable closure and
//!   bulk cancellation
//! - **Elastic pool**: a bounded queue served by one to `max_active` worker
//!   threads, with panic isolation and a graceful drain on close
//! - **Events**: severity-filtered pool events, also logged through `tracing`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jobpool::prelude::*;
//!
//! let mut graph = JobGraph::new();
//! let fetch = graph.add_job("fetch", Arc::new(FnHandler::new(|| Ok(json!(3)))));
//! let store = graph.add_job("store", Arc::new(NoOpHandler));
//! graph.when(store, all_parents_succeeded)?.after(store, &[fetch])?;
//!
//! let graph = Arc::new(graph);
//! let pipeline = Pipeline::new("ingest", &graph, &[fetch, store])?;
//!
//! let pool = Pool::new(PoolConfig::new().with_capacity(16))?;
//! pool.add_pipeline(&pipeline)?;
//! pool.close("done")?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod core;
pub mod errors;
pub mod events;
pub mod job;
pub mod observability;
pub mod pipeline;
pub mod pool;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{JobOutcome, JobStatus, PoolStatus};
    pub use crate::errors::{
        CycleDetectedError, DuplicateEdgeError, HandlerPanicError, JobFailure, JobPoolError,
        NoRootJobsError, PoolClosedError,
    };
    pub use crate::events::{
        CollectingEventSink, Event, EventLevel, EventSink, FnEventSink, LoggingEventSink,
        NoOpEventSink,
    };
    pub use crate::job::{
        all_parents_succeeded, FnHandler, JobGraph, JobHandler, JobId, JobRef, NoOpHandler,
    };
    pub use crate::observability::{init_tracing, TracingConfig};
    pub use crate::pipeline::Pipeline;
    pub use crate::pool::{Pool, PoolConfig, PoolHooks};
}
