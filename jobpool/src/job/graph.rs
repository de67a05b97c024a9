//! Arena-backed job dependency graph.
//!
//! Jobs are stored in a [`JobGraph`] and addressed by [`JobId`]. Edges are id
//! lists, so parents and children can point at each other without any
//! ownership cycle. Structure is only mutable through `&mut JobGraph`; once the
//! graph is shared behind an [`Arc`] only the per-job run state changes.

use super::handle::JobRef;
use super::handler::JobHandler;
use crate::core::{JobOutcome, JobStatus};
use crate::errors::{CycleDetectedError, DuplicateEdgeError, JobPoolError};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A readiness predicate evaluated against the job it is installed on.
pub type ReadyPredicate = Arc<dyn Fn(&JobRef) -> bool + Send + Sync>;

/// A hook invoked right after a job records its outcome.
pub type ResultCallback = Arc<dyn Fn(&JobOutcome) + Send + Sync>;

/// Stable identifier of a job inside its [`JobGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(usize);

impl JobId {
    /// Returns the arena index of this job.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mutable run state of a job, guarded by the job's own lock.
#[derive(Debug, Default)]
pub(crate) struct JobState {
    pub(crate) status: JobStatus,
    pub(crate) outcome: Option<JobOutcome>,
}

/// A single job in the arena.
pub(crate) struct JobNode {
    pub(crate) name: String,
    pub(crate) handler: Arc<dyn JobHandler>,
    pub(crate) parents: Vec<JobId>,
    pub(crate) children: Vec<JobId>,
    pub(crate) when: Option<ReadyPredicate>,
    pub(crate) on_result: Option<ResultCallback>,
    pub(crate) state: Mutex<JobState>,
}

impl JobNode {
    fn new(name: String, handler: Arc<dyn JobHandler>) -> Self {
        Self {
            name,
            handler,
            parents: Vec::new(),
            children: Vec::new(),
            when: None,
            on_result: None,
            state: Mutex::new(JobState::default()),
        }
    }

    pub(crate) fn status(&self) -> JobStatus {
        self.state.lock().status
    }

    pub(crate) fn set_status(&self, status: JobStatus) {
        self.state.lock().status = status;
    }

    /// Moves the job to `Running` unless it was cancelled.
    ///
    /// Returns false for a cancelled job, which must then be skipped.
    pub(crate) fn try_start(&self) -> bool {
        let mut state = self.state.lock();
        if state.status == JobStatus::Cancelled {
            return false;
        }
        state.status = JobStatus::Running;
        true
    }

    /// Records the outcome and fires the result callback with the lock held.
    pub(crate) fn set_outcome(&self, outcome: JobOutcome) {
        let mut state = self.state.lock();
        state.status = if outcome.is_ok() {
            JobStatus::Success
        } else {
            JobStatus::Fail
        };
        let outcome = state.outcome.insert(outcome);
        if let Some(callback) = &self.on_result {
            callback(outcome);
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// An arena of jobs and the dependency edges between them.
#[derive(Default)]
pub struct JobGraph {
    pub(crate) nodes: Vec<JobNode>,
}

impl JobGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of jobs in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph holds no jobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a new pending job without edges.
    ///
    /// Names do not have to be unique, but edge declarations compare jobs by
    /// name, so jobs sharing a name cannot be linked to each other.
    pub fn add_job(&mut self, name: impl Into<String>, handler: Arc<dyn JobHandler>) -> JobId {
        let id = JobId(self.nodes.len());
        self.nodes.push(JobNode::new(name.into(), handler));
        id
    }

    /// Returns an iterator over every job id in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = JobId> + '_ {
        (0..self.nodes.len()).map(JobId)
    }

    /// Returns the name of a job.
    #[must_use]
    pub fn name(&self, id: JobId) -> Option<&str> {
        self.nodes.get(id.0).map(|node| node.name.as_str())
    }

    /// Returns the parents of a job in declaration order.
    #[must_use]
    pub fn parents(&self, id: JobId) -> &[JobId] {
        self.nodes.get(id.0).map_or(&[], |node| node.parents.as_slice())
    }

    /// Returns the children of a job in declaration order.
    #[must_use]
    pub fn children(&self, id: JobId) -> &[JobId] {
        self.nodes.get(id.0).map_or(&[], |node| node.children.as_slice())
    }

    /// Declares `job` a child of each of `others`: it runs after them.
    ///
    /// Pairs are processed in order; pairs before a failing one stay linked.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateEdgeError`] if a pair shares a name or the edge
    /// already exists, [`CycleDetectedError`] if the edge would close a cycle
    /// (the edge is not kept), and `UnknownJob` for foreign ids.
    pub fn after(&mut self, job: JobId, others: &[JobId]) -> Result<(), JobPoolError> {
        self.check_id(job)?;
        for &other in others {
            self.check_id(other)?;
            let (job_name, other_name) = (&self.nodes[job.0].name, &self.nodes[other.0].name);
            if job_name == other_name || self.any_named(&self.nodes[job.0].parents, other_name) {
                return Err(DuplicateEdgeError::new(job_name.clone(), other_name.clone()).into());
            }
            self.link(other, job);
            if let Some(cycle) = self.find_cycle(&[job]) {
                self.unlink(other, job);
                return Err(self.cycle_error(&cycle).into());
            }
        }
        Ok(())
    }

    /// Declares `job` a parent of each of `others`: they run after it.
    ///
    /// # Errors
    ///
    /// Same as [`JobGraph::after`].
    pub fn before(&mut self, job: JobId, others: &[JobId]) -> Result<(), JobPoolError> {
        self.check_id(job)?;
        for &other in others {
            self.check_id(other)?;
            let (job_name, other_name) = (&self.nodes[job.0].name, &self.nodes[other.0].name);
            if job_name == other_name || self.any_named(&self.nodes[job.0].children, other_name) {
                return Err(DuplicateEdgeError::new(job_name.clone(), other_name.clone()).into());
            }
            self.link(job, other);
            if let Some(cycle) = self.find_cycle(&[job]) {
                self.unlink(job, other);
                return Err(self.cycle_error(&cycle).into());
            }
        }
        Ok(())
    }

    /// Installs a readiness predicate on a job.
    ///
    /// A job with a predicate is only offered to the pool when a parent
    /// finishes and the predicate returns true. Without one, every finishing
    /// parent offers it.
    ///
    /// # Errors
    ///
    /// Returns `UnknownJob` for a foreign id.
    pub fn when<F>(&mut self, job: JobId, predicate: F) -> Result<&mut Self, JobPoolError>
    where
        F: Fn(&JobRef) -> bool + Send + Sync + 'static,
    {
        self.check_id(job)?;
        self.nodes[job.0].when = Some(Arc::new(predicate));
        Ok(self)
    }

    /// Installs a hook invoked right after the job records its outcome.
    ///
    /// The hook runs on the worker thread while the job's lock is held, so it
    /// must not read that job's status or result.
    ///
    /// # Errors
    ///
    /// Returns `UnknownJob` for a foreign id.
    pub fn with_result_callback<F>(
        &mut self,
        job: JobId,
        callback: F,
    ) -> Result<&mut Self, JobPoolError>
    where
        F: Fn(&JobOutcome) + Send + Sync + 'static,
    {
        self.check_id(job)?;
        self.nodes[job.0].on_result = Some(Arc::new(callback));
        Ok(self)
    }

    /// Returns a shareable handle to a job.
    #[must_use]
    pub fn job(self: &Arc<Self>, id: JobId) -> Option<JobRef> {
        (id.0 < self.nodes.len()).then(|| JobRef::new(Arc::clone(self), id))
    }

    /// Returns handles to every job in insertion order.
    #[must_use]
    pub fn jobs(self: &Arc<Self>) -> Vec<JobRef> {
        self.ids().map(|id| JobRef::new(Arc::clone(self), id)).collect()
    }

    pub(crate) fn check_id(&self, id: JobId) -> Result<(), JobPoolError> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(JobPoolError::UnknownJob(id.0))
        }
    }

    /// Searches for a cycle reachable from `starts`.
    ///
    /// Depth-first with three-state marks shared across all starts. Returns the
    /// cycle as ids, with the re-entered job at both ends.
    pub(crate) fn find_cycle(&self, starts: &[JobId]) -> Option<Vec<JobId>> {
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        // (job, next child to look at); the jobs on it form the current path
        let mut stack: Vec<(JobId, usize)> = Vec::new();

        for &start in starts {
            if marks[start.0] != Mark::Unvisited {
                continue;
            }
            marks[start.0] = Mark::InProgress;
            stack.push((start, 0));

            while let Some(top) = stack.last_mut() {
                let (id, next) = *top;
                let Some(&child) = self.nodes[id.0].children.get(next) else {
                    marks[id.0] = Mark::Done;
                    stack.pop();
                    continue;
                };
                top.1 += 1;
                match marks[child.0] {
                    Mark::Unvisited => {
                        marks[child.0] = Mark::InProgress;
                        stack.push((child, 0));
                    }
                    Mark::InProgress => {
                        let from = stack.iter().position(|&(n, _)| n == child).unwrap_or(0);
                        let mut cycle: Vec<JobId> =
                            stack[from..].iter().map(|&(n, _)| n).collect();
                        cycle.push(child);
                        return Some(cycle);
                    }
                    Mark::Done => {}
                }
            }
        }
        None
    }

    pub(crate) fn cycle_error(&self, cycle: &[JobId]) -> CycleDetectedError {
        CycleDetectedError::new(
            cycle
                .iter()
                .map(|id| self.nodes[id.0].name.clone())
                .collect(),
        )
    }

    fn any_named(&self, ids: &[JobId], name: &str) -> bool {
        ids.iter().any(|id| self.nodes[id.0].name == name)
    }

    fn link(&mut self, parent: JobId, child: JobId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parents.push(parent);
    }

    // Only ever undoes the most recent `link`.
    fn unlink(&mut self, parent: JobId, child: JobId) {
        self.nodes[parent.0].children.pop();
        self.nodes[child.0].parents.pop();
    }
}

impl fmt::Debug for JobGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for node in &self.nodes {
            let children: Vec<&str> = node
                .children
                .iter()
                .map(|id| self.nodes[id.0].name.as_str())
                .collect();
            list.entry(&format_args!("{} -> {:?}", node.name, children));
        }
        list.finish()
    }
}
