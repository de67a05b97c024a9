//! Validated job pipelines.
//!
//! A [`Pipeline`] is a named set of jobs from one [`JobGraph`] that has been
//! checked to form a DAG. It knows its root jobs (the ones the pool starts
//! from) and the closure of everything reachable from them.

use crate::core::JobStatus;
use crate::errors::{JobPoolError, NoRootJobsError};
use crate::job::{JobGraph, JobId, JobRef};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

/// A named, validated acyclic set of jobs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// The pipeline name.
    name: String,
    /// The graph the jobs live in.
    graph: Arc<JobGraph>,
    /// Member jobs as given.
    jobs: Vec<JobId>,
    /// Members without parents.
    roots: Vec<JobId>,
    /// Every job reachable from the roots, each once, in depth-first pre-order.
    unique_jobs: Vec<JobId>,
}

impl Pipeline {
    /// Validates `jobs` and builds a pipeline.
    ///
    /// # Errors
    ///
    /// Returns `NoRootJobs` when no member is parentless (including an empty
    /// member list), `CycleDetected` when a cycle is reachable from the roots,
    /// and `UnknownJob` for ids that are not in `graph`.
    pub fn new(
        name: impl Into<String>,
        graph: &Arc<JobGraph>,
        jobs: &[JobId],
    ) -> Result<Self, JobPoolError> {
        let name = name.into();
        for &id in jobs {
            graph.check_id(id)?;
        }

        let roots: Vec<JobId> = jobs
            .iter()
            .copied()
            .filter(|&id| graph.parents(id).is_empty())
            .collect();
        if roots.is_empty() {
            return Err(NoRootJobsError::new(name).into());
        }

        if let Some(cycle) = graph.find_cycle(&roots) {
            return Err(graph.cycle_error(&cycle).into());
        }

        let unique_jobs = reachable_from(graph, &roots);
        debug!(
            pipeline = %name,
            roots = roots.len(),
            jobs = unique_jobs.len(),
            "pipeline validated"
        );

        Ok(Self {
            name,
            graph: Arc::clone(graph),
            jobs: jobs.to_vec(),
            roots,
            unique_jobs,
        })
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the graph the pipeline's jobs live in.
    #[must_use]
    pub const fn graph(&self) -> &Arc<JobGraph> {
        &self.graph
    }

    /// Returns the member jobs as given at construction.
    #[must_use]
    pub fn jobs(&self) -> Vec<JobRef> {
        self.handles(&self.jobs)
    }

    /// Returns the root jobs, the ones submitted to a pool.
    #[must_use]
    pub fn roots(&self) -> Vec<JobRef> {
        self.handles(&self.roots)
    }

    /// Returns every job reachable from the roots.
    #[must_use]
    pub fn unique_jobs(&self) -> Vec<JobRef> {
        self.handles(&self.unique_jobs)
    }

    /// Marks every reachable job as cancelled.
    ///
    /// Cancellation is cooperative: queued jobs are dropped when a worker
    /// picks them up, running jobs finish normally.
    pub fn cancel(&self) {
        for &id in &self.unique_jobs {
            self.graph.nodes[id.index()].set_status(JobStatus::Cancelled);
        }
        debug!(pipeline = %self.name, jobs = self.unique_jobs.len(), "pipeline cancelled");
    }

    /// Renders the reachable jobs as a Graphviz `digraph`.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph \"{}\" {{", escape(&self.name));
        for &id in &self.unique_jobs {
            let name = escape(self.graph.name(id).unwrap_or_default());
            let _ = writeln!(out, "    \"{name}\";");
        }
        for &id in &self.unique_jobs {
            let parent = escape(self.graph.name(id).unwrap_or_default());
            for &child in self.graph.children(id) {
                let child = escape(self.graph.name(child).unwrap_or_default());
                let _ = writeln!(out, "    \"{parent}\" -> \"{child}\";");
            }
        }
        out.push('}');
        out
    }

    fn handles(&self, ids: &[JobId]) -> Vec<JobRef> {
        ids.iter()
            .map(|&id| JobRef::new(Arc::clone(&self.graph), id))
            .collect()
    }
}

/// Collects every job reachable from `roots`, each once, in pre-order.
fn reachable_from(graph: &JobGraph, roots: &[JobId]) -> Vec<JobId> {
    let mut seen = vec![false; graph.len()];
    let mut out = Vec::new();
    let mut stack: Vec<JobId> = roots.iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        if seen[id.index()] {
            continue;
        }
        seen[id.index()] = true;
        out.push(id);
        // reversed so the first child is visited first
        stack.extend(graph.children(id).iter().rev());
    }
    out
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
