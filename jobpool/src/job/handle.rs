//! Shareable job handles.

use super::graph::{JobGraph, JobId, JobNode};
use super::handler::JobHandler;
use crate::core::{JobOutcome, JobStatus};
use crate::errors::JobFailure;
use std::fmt;
use std::sync::Arc;

/// A cheap, cloneable handle to one job of a shared [`JobGraph`].
///
/// This is what flows through the pool queue and what readiness predicates
/// receive. All reads go through the job's own lock.
#[derive(Clone)]
pub struct JobRef {
    graph: Arc<JobGraph>,
    id: JobId,
}

impl JobRef {
    pub(crate) const fn new(graph: Arc<JobGraph>, id: JobId) -> Self {
        Self { graph, id }
    }

    /// Creates a job in a graph of its own.
    ///
    /// Useful for submitting independent work that has no dependencies.
    #[must_use]
    pub fn standalone(name: impl Into<String>, handler: Arc<dyn JobHandler>) -> Self {
        let mut graph = JobGraph::new();
        let id = graph.add_job(name, handler);
        Self::new(Arc::new(graph), id)
    }

    /// Returns the job id.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Returns the graph this job belongs to.
    #[must_use]
    pub const fn graph(&self) -> &Arc<JobGraph> {
        &self.graph
    }

    /// Returns the job name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.node().name
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.node().status()
    }

    /// Returns the recorded outcome, or `None` if the handler has not finished.
    #[must_use]
    pub fn result(&self) -> Option<JobOutcome> {
        self.node().state.lock().outcome.clone()
    }

    /// Returns the recorded failure, if the job failed.
    #[must_use]
    pub fn error(&self) -> Option<JobFailure> {
        match &self.node().state.lock().outcome {
            Some(Err(failure)) => Some(failure.clone()),
            _ => None,
        }
    }

    /// Returns handles to the upstream jobs.
    #[must_use]
    pub fn parents(&self) -> Vec<Self> {
        self.handles(&self.node().parents)
    }

    /// Returns handles to the downstream jobs.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.handles(&self.node().children)
    }

    /// Returns true if both handles point at the same job of the same graph.
    #[must_use]
    pub fn same_job(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.graph, &other.graph) && self.id == other.id
    }

    pub(crate) fn node(&self) -> &JobNode {
        &self.graph.nodes[self.id.index()]
    }

    pub(crate) fn set_status(&self, status: JobStatus) {
        self.node().set_status(status);
    }

    /// Children that may run now that this job has finished.
    ///
    /// A child without a predicate is always included. Nothing prevents two
    /// parents finishing together from both offering the same child.
    pub(crate) fn ready_children(&self) -> Vec<Self> {
        self.node()
            .children
            .iter()
            .map(|&id| Self::new(Arc::clone(&self.graph), id))
            .filter(|child| child.node().when.as_ref().map_or(true, |when| when(child)))
            .collect()
    }

    fn handles(&self, ids: &[JobId]) -> Vec<Self> {
        ids.iter()
            .map(|&id| Self::new(Arc::clone(&self.graph), id))
            .collect()
    }
}

impl fmt::Display for JobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for JobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRef")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("status", &self.status())
            .finish()
    }
}

/// Readiness predicate that holds once every parent has succeeded.
///
/// ```rust,ignore
/// graph.when(deploy, all_parents_succeeded)?.after(deploy, &[build, test])?;
/// ```
#[must_use]
pub fn all_parents_succeeded(job: &JobRef) -> bool {
    job.parents().iter().all(|parent| parent.status().is_success())
}
