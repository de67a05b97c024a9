//! Bounded ready-job queue shared by submitters and workers.

use crate::errors::PoolClosedError;
use crate::job::JobRef;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Result of waiting for a job.
#[derive(Debug)]
pub(crate) enum Pop {
    /// A job to run. The caller must call [`JobQueue::done`] when finished.
    Job(JobRef),
    /// Nothing arrived within the timeout.
    Timeout,
    /// The queue is closed and empty.
    Closed,
}

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<JobRef>,
    in_flight: usize,
    closed: bool,
}

impl QueueState {
    fn is_drained(&self) -> bool {
        self.items.is_empty() && self.in_flight == 0
    }
}

/// A FIFO with a capacity bound for external submitters.
///
/// Jobs popped by a worker stay "in flight" until the worker calls
/// [`done`](Self::done), after it has pushed the job's ready children. The
/// queue is therefore drained only when nothing is queued and nothing is being
/// worked on.
#[derive(Debug)]
pub(crate) struct JobQueue {
    capacity: usize,
    state: Mutex<QueueState>,
    not_empty: Condvar,
    not_full: Condvar,
    drained: Condvar,
}

impl JobQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(QueueState::default()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            drained: Condvar::new(),
        }
    }

    /// Enqueues a job, blocking while the queue is full.
    pub(crate) fn push(&self, job: JobRef) -> Result<(), PoolClosedError> {
        let mut state = self.state.lock();
        while state.items.len() >= self.capacity && !state.closed {
            self.not_full.wait(&mut state);
        }
        if state.closed {
            return Err(PoolClosedError);
        }
        state.items.push_back(job);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Enqueues jobs from a worker without waiting for capacity.
    ///
    /// Accepted even after [`close`](Self::close): closed queues still hand
    /// out what they hold, so fan-out from the last in-flight jobs runs.
    pub(crate) fn push_internal(&self, jobs: Vec<JobRef>) {
        if jobs.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        let added = jobs.len();
        state.items.extend(jobs);
        if added == 1 {
            self.not_empty.notify_one();
        } else {
            self.not_empty.notify_all();
        }
    }

    /// Waits up to `timeout` for a job.
    pub(crate) fn pop_timeout(&self, timeout: Duration) -> Pop {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(job) = state.items.pop_front() {
                state.in_flight += 1;
                self.not_full.notify_one();
                return Pop::Job(job);
            }
            if state.closed {
                return Pop::Closed;
            }
            let timed_out = self.not_empty.wait_until(&mut state, deadline).timed_out();
            if timed_out && state.items.is_empty() && !state.closed {
                return Pop::Timeout;
            }
        }
    }

    /// Marks one popped job as finished.
    pub(crate) fn done(&self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.is_drained() {
            self.drained.notify_all();
        }
    }

    /// Blocks until no job is queued or in flight.
    pub(crate) fn wait_drained(&self) {
        let mut state = self.state.lock();
        while !state.is_drained() {
            self.drained.wait(&mut state);
        }
    }

    /// Rejects further external pushes and wakes every waiter.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    pub(crate) const fn capacity(&self) -> usize {
        self.capacity
    }
}
