//! Worker threads: the execution loop, elastic sizing and panic isolation.

use super::config::panic_message;
use super::queue::Pop;
use super::PoolInner;
use crate::core::JobStatus;
use crate::errors::{HandlerPanicError, JobFailure, JobPoolError};
use crate::events::EventLevel;
use crate::job::JobRef;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info_span, trace};

/// How a worker left [`PoolInner::run_job`].
enum RunResult {
    /// Keep pulling jobs.
    Continue,
    /// The job was cancelled before it started; nothing ran.
    Skipped,
    /// The handler panicked and a replacement took this worker's slot.
    Replaced,
}

impl PoolInner {
    /// Starts a worker for a slot already counted in `workers`.
    ///
    /// On failure the slot is released again.
    pub(crate) fn spawn_worker(self: &Arc<Self>) -> Result<usize, JobPoolError> {
        let worker_id = self.next_worker_id.fetch_add(1, Ordering::SeqCst);
        let inner = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("jobpool-{}-{worker_id}", self.short_id()))
            .spawn(move || inner.run_worker(worker_id));

        match spawned {
            Ok(_) => {
                self.events
                    .emit(EventLevel::Info, format!("worker '{worker_id}' started"));
                Ok(worker_id)
            }
            Err(e) => {
                self.workers.fetch_sub(1, Ordering::SeqCst);
                self.events.emit(
                    EventLevel::Error,
                    format!("worker '{worker_id}' failed to start: {e}"),
                );
                Err(JobPoolError::WorkerSpawn(e.to_string()))
            }
        }
    }

    /// Adds a worker if the backlog exceeds half the capacity and the pool
    /// is below its ceiling.
    fn scale_up(self: &Arc<Self>) {
        if self.queue.len() <= self.queue.capacity() / 2 {
            return;
        }
        let max = self.config.max_active;
        let reserved = self
            .workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < max).then_some(n + 1));
        if let Ok(previous) = reserved {
            debug!(pool = %self.id, workers = previous + 1, max, "scaling up");
            // spawn errors are already reported as events
            let _ = self.spawn_worker();
        }
    }

    /// Releases this worker's slot unless it is the last one.
    fn retire_idle(&self) -> bool {
        self.workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n > 1).then(|| n - 1))
            .is_ok()
    }

    fn run_worker(self: Arc<Self>, worker_id: usize) {
        let span = info_span!("worker", pool = %self.id, worker = worker_id);
        let _enter = span.enter();

        loop {
            match self.queue.pop_timeout(self.config.idle_lifetime) {
                Pop::Job(job) => match self.run_job(worker_id, &job) {
                    RunResult::Continue => self.scale_up(),
                    RunResult::Skipped => {}
                    RunResult::Replaced => return,
                },
                Pop::Timeout => {
                    if self.retire_idle() {
                        self.events.emit(
                            EventLevel::Info,
                            format!(
                                "worker '{worker_id}' idle for {}ms, exiting",
                                self.config.idle_lifetime.as_millis()
                            ),
                        );
                        return;
                    }
                    trace!(worker = worker_id, "idle, staying as baseline worker");
                }
                Pop::Closed => {
                    self.workers.fetch_sub(1, Ordering::SeqCst);
                    self.events
                        .emit(EventLevel::Info, format!("worker '{worker_id}' exit"));
                    return;
                }
            }
        }
    }

    fn run_job(self: &Arc<Self>, worker_id: usize, job: &JobRef) -> RunResult {
        let node = job.node();
        if !node.try_start() {
            self.events.emit(
                EventLevel::Debug,
                format!("job '{}' cancelled, skipped", job.name()),
            );
            self.queue.done();
            return RunResult::Skipped;
        }

        let running = self.runners.fetch_add(1, Ordering::SeqCst) + 1;
        self.events
            .emit(EventLevel::Debug, format!("job '{}' start", job.name()));
        debug!(job = %job.name(), worker = worker_id, running, "running job");

        let started = Instant::now();
        let executed = panic::catch_unwind(AssertUnwindSafe(|| {
            let outcome = node.handler.handle().map_err(JobFailure::from);
            node.set_outcome(outcome);
            job.ready_children()
        }));

        match executed {
            Ok(ready) => {
                self.runners.fetch_sub(1, Ordering::SeqCst);
                let status = job.status();
                self.events.emit(
                    EventLevel::Debug,
                    format!("job '{}' finish: {status}", job.name()),
                );
                debug!(
                    job = %job.name(),
                    worker = worker_id,
                    %status,
                    duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                    ready = ready.len(),
                    "job finished"
                );
                if !ready.is_empty() {
                    self.queue.push_internal(ready);
                }
                self.queue.done();
                RunResult::Continue
            }
            Err(payload) => {
                let backtrace = Backtrace::force_capture();
                let message = panic_message(payload.as_ref());
                // a panicking callback or predicate leaves the status already set
                if node.status() == JobStatus::Running {
                    node.set_outcome(Err(HandlerPanicError::new(job.name(), &message).into()));
                }
                self.runners.fetch_sub(1, Ordering::SeqCst);
                self.events.emit(
                    EventLevel::Error,
                    format!("job '{}' panicked: {message}", job.name()),
                );

                // the replacement inherits this worker's slot
                if self.spawn_worker().is_ok() {
                    self.events.emit(
                        EventLevel::Warning,
                        format!("worker '{worker_id}' replaced after panic"),
                    );
                }
                if let Some(handler) = &self.panic_handler {
                    let hook = panic::catch_unwind(AssertUnwindSafe(|| {
                        handler(payload.as_ref(), &backtrace);
                    }));
                    if let Err(hook_payload) = hook {
                        self.events.emit(
                            EventLevel::Error,
                            format!(
                                "panic handler panicked: {}",
                                panic_message(hook_payload.as_ref())
                            ),
                        );
                    }
                }
                // after the hook so close() cannot return while it still runs
                self.queue.done();
                RunResult::Replaced
            }
        }
    }
}
