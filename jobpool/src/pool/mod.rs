//! The elastic worker pool.
//!
//! A [`Pool`] owns a bounded queue of ready jobs and between one and
//! `max_active` worker threads. Workers run a job's handler, record the
//! outcome, then push whichever children became ready back onto the queue.
//! There is no scheduler beyond that: the dependency graph drives itself.
//!
//! ```rust,ignore
//! let pool = Pool::new(PoolConfig::new().with_capacity(16))?;
//! pool.add_pipeline(&pipeline)?;
//! pool.close("done")?;
//! ```

mod config;
mod queue;
mod worker;


pub use config::{
    ExitHandler, PanicHandler, PoolConfig, PoolHooks, ResolvedConfig, DEFAULT_IDLE_LIFETIME_MS,
    DEFAULT_POOL_CAPACITY,
};

use crate::core::PoolStatus;
use crate::errors::{JobPoolError, PoolClosedError};
use crate::events::{EventEmitter, EventLevel};
use crate::job::JobRef;
use crate::pipeline::Pipeline;
use parking_lot::RwLock;
use queue::JobQueue;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Interval at which `close` checks whether every worker has exited.
const WORKER_EXIT_POLL: Duration = Duration::from_millis(10);

/// State shared between the pool handle and its workers.
pub(crate) struct PoolInner {
    id: String,
    config: ResolvedConfig,
    queue: JobQueue,
    status: RwLock<PoolStatus>,
    workers: AtomicUsize,
    runners: AtomicUsize,
    next_worker_id: AtomicUsize,
    events: EventEmitter,
    panic_handler: Option<PanicHandler>,
    exit_handler: Option<ExitHandler>,
}

impl PoolInner {
    fn short_id(&self) -> &str {
        self.id.split('-').next().unwrap_or(&self.id)
    }
}

/// A bounded, elastic pool of worker threads.
///
/// The pool is torn down with [`close`](Self::close). Dropping a pool that
/// was never closed stops intake and lets the workers finish what is queued
/// in the background.
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    /// Creates a pool without hooks and starts its first worker.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a zero idle lifetime and `WorkerSpawn` if
    /// the first worker thread cannot be started.
    pub fn new(config: PoolConfig) -> Result<Self, JobPoolError> {
        Self::with_hooks(config, PoolHooks::default())
    }

    /// Creates a pool with event, panic and exit hooks.
    ///
    /// # Errors
    ///
    /// Same as [`Pool::new`].
    pub fn with_hooks(config: PoolConfig, hooks: PoolHooks) -> Result<Self, JobPoolError> {
        let config = config.resolve()?;
        let id = Uuid::new_v4().to_string();
        let events = EventEmitter::new(id.clone(), config.event_level, hooks.event_sink);

        let inner = Arc::new(PoolInner {
            id,
            config,
            queue: JobQueue::new(config.capacity),
            status: RwLock::new(PoolStatus::Running),
            workers: AtomicUsize::new(1),
            runners: AtomicUsize::new(0),
            next_worker_id: AtomicUsize::new(1),
            events,
            panic_handler: hooks.panic_handler,
            exit_handler: hooks.exit_handler,
        });
        inner.spawn_worker()?;

        info!(
            pool = %inner.id,
            capacity = config.capacity,
            max_active = config.max_active,
            idle_lifetime_ms = u64::try_from(config.idle_lifetime.as_millis()).unwrap_or(u64::MAX),
            "pool started"
        );
        Ok(Self { inner })
    }

    /// Returns the pool's unique id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Returns the configuration with defaults applied.
    #[must_use]
    pub fn config(&self) -> ResolvedConfig {
        self.inner.config
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        *self.inner.status.read()
    }

    /// Returns the number of handlers executing right now.
    #[must_use]
    pub fn running_jobs(&self) -> usize {
        self.inner.runners.load(Ordering::SeqCst)
    }

    /// Returns the number of queued jobs.
    #[must_use]
    pub fn pending_jobs(&self) -> usize {
        self.inner.queue.len()
    }

    /// Returns the number of live worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.inner.workers.load(Ordering::SeqCst)
    }

    /// Submits one job, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns `PoolClosed` once `close` has been called.
    pub fn add_job(&self, job: JobRef) -> Result<(), JobPoolError> {
        if self.status().is_closed() {
            return Err(PoolClosedError.into());
        }
        self.inner
            .events
            .emit(EventLevel::Debug, format!("add job '{}'", job.name()));
        self.inner.queue.push(job)?;
        Ok(())
    }

    /// Submits jobs in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns `PoolClosed` once `close` has been called. Jobs submitted
    /// before the error stay queued.
    pub fn add_jobs<I>(&self, jobs: I) -> Result<(), JobPoolError>
    where
        I: IntoIterator<Item = JobRef>,
    {
        jobs.into_iter().try_for_each(|job| self.add_job(job))
    }

    /// Submits a pipeline's root jobs. The rest follow as their parents finish.
    ///
    /// # Errors
    ///
    /// Returns `PoolClosed` once `close` has been called.
    pub fn add_pipeline(&self, pipeline: &Pipeline) -> Result<(), JobPoolError> {
        debug!(
            pool = %self.inner.id,
            pipeline = %pipeline.name(),
            roots = pipeline.roots().len(),
            "submitting pipeline"
        );
        self.add_jobs(pipeline.roots())
    }

    /// Drains the pool and stops every worker.
    ///
    /// Blocks until nothing is queued or running, closes the queue, waits for
    /// the workers to exit and then calls the exit handler with `reason`.
    /// Must not be called from inside a job handler, which would wait on
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns `PoolClosed` if the pool is already exiting or exited.
    pub fn close(&self, reason: &str) -> Result<(), JobPoolError> {
        {
            let mut status = self.inner.status.write();
            if status.is_closed() {
                return Err(PoolClosedError.into());
            }
            *status = PoolStatus::Exiting;
        }
        self.inner
            .events
            .emit(EventLevel::Info, format!("pool exiting: {reason}"));

        self.inner.queue.wait_drained();
        self.inner.queue.close();
        debug!(pool = %self.inner.id, workers = self.workers(), "queue drained, waiting for workers");

        while self.inner.workers.load(Ordering::SeqCst) > 0 {
            thread::sleep(WORKER_EXIT_POLL);
        }

        if let Some(handler) = &self.inner.exit_handler {
            handler(reason);
        }
        *self.inner.status.write() = PoolStatus::Exited;
        self.inner.events.emit(EventLevel::Info, "pool exited");
        Ok(())
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        {
            let mut status = self.inner.status.write();
            if *status != PoolStatus::Running {
                return;
            }
            *status = PoolStatus::Exiting;
        }
        self.inner.events.emit(
            EventLevel::Warning,
            format!(
                "pool dropped without close, {} queued jobs left to workers",
                self.inner.queue.len()
            ),
        );
        self.inner.queue.close();
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.inner.id)
            .field("status", &self.status())
            .field("workers", &self.workers())
            .field("running_jobs", &self.running_jobs())
            .field("pending_jobs", &self.pending_jobs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::NoOpHandler;

    fn pool() -> Pool {
        Pool::new(PoolConfig::new().with_capacity(4)).unwrap()
    }

    #[test]
    fn test_new_pool_starts_one_worker() {
        let pool = pool();
        assert_eq!(pool.status(), PoolStatus::Running);
        assert_eq!(pool.workers(), 1);
        assert_eq!(pool.running_jobs(), 0);
        assert_eq!(pool.pending_jobs(), 0);
        assert_eq!(pool.config().max_active, 2);
        pool.close("test").unwrap();
    }

    #[test]
    fn test_invalid_config() {
        let err = Pool::new(PoolConfig::new().with_idle_lifetime_ms(0)).unwrap_err();
        assert!(matches!(err, JobPoolError::InvalidConfig(_)));
    }

    #[test]
    fn test_close_twice() {
        let pool = pool();
        pool.close("first").unwrap();
        assert_eq!(pool.status(), PoolStatus::Exited);
        assert_eq!(pool.workers(), 0);

        let err = pool.close("second").unwrap_err();
        assert_eq!(err.to_string(), "Pool exit");
    }

    #[test]
    fn test_add_after_close() {
        let pool = pool();
        pool.close("done").unwrap();

        let err = pool
            .add_job(JobRef::standalone("late", Arc::new(NoOpHandler)))
            .unwrap_err();
        assert!(matches!(err, JobPoolError::PoolClosed(_)));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = pool();
        let b = pool();
        assert_ne!(a.id(), b.id());
        assert!(format!("{a:?}").contains(a.id()));
    }
}
