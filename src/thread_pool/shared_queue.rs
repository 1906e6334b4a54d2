use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, error};

use super::blocking_queue::BlockingQueue;
use super::task_handle::{panic_message, task_slot, TaskHandle};
use crate::{PoolError, Result};

/// A type-erased unit of work as stored in the queue.
type Job = Box<dyn FnOnce() + Send + 'static>;

const RUNNING: u8 = 0;
const SHUTTING_DOWN: u8 = 1;
const STOPPED: u8 = 2;

/// Lifecycle of a [`ThreadPool`]. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Accepting jobs.
    Running,
    /// The queue is closed and workers are draining it.
    ShuttingDown,
    /// Every worker has exited.
    Stopped,
}

/// A fixed-size thread pool fed by a single shared FIFO queue.
///
/// Workers pop jobs in submission order until the queue is closed and
/// drained. A panicking job is caught; its worker keeps serving the queue.
/// Dropping the pool performs the same shutdown as [`ThreadPool::shutdown`].
pub struct ThreadPool {
    queue: Arc<BlockingQueue<Job>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    state: AtomicU8,
}

impl ThreadPool {
    /// Creates a pool with `threads` workers, or one per available CPU
    /// when `None`. A count of zero is raised to one.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker list cannot be allocated or a worker
    /// thread cannot be spawned. Workers started before a spawn failure are
    /// shut down first.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let worker_count = threads.unwrap_or_else(num_cpus::get).max(1);
        let queue = Arc::new(BlockingQueue::new());

        let mut workers: Vec<JoinHandle<()>> = Vec::new();
        if workers.try_reserve_exact(worker_count).is_err() {
            error!("Cannot allocate {worker_count} workers");
            return Err(PoolError::TooManyWorkers(worker_count));
        }
        for id in 0..worker_count {
            match spawn_worker(id, Arc::clone(&queue)) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    error!("Failed to spawn worker {id}: {e}");
                    queue.close();
                    for worker in workers {
                        let _ = worker.join();
                    }
                    return Err(e.into());
                }
            }
        }
        debug!("Thread pool started with {worker_count} workers");

        Ok(ThreadPool {
            queue,
            workers: Mutex::new(workers),
            worker_count,
            state: AtomicU8::new(RUNNING),
        })
    }

    /// Queues a fire-and-forget job.
    ///
    /// Returns `false` if the pool is shutting down; `job` is then dropped
    /// without running.
    pub fn post<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(Box::new(job))
    }

    /// Queues `job` and returns whether it was accepted together with a
    /// handle to its outcome.
    ///
    /// A rejected job never runs and its handle yields
    /// [`PoolError::ShutDown`]. An accepted job completes its handle
    /// exactly once, with the return value or with
    /// [`PoolError::TaskPanicked`] if it panicked.
    ///
    /// A job that blocks on the handle of another job submitted to the same
    /// pool can deadlock once every worker is blocked that way. The pool does
    /// not detect this.
    pub fn submit<F, T>(&self, job: F) -> (bool, TaskHandle<T>)
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (completer, handle) = task_slot();
        // Writes only if the queue refuses the job, in which case the job
        // and its own completer are dropped unrun.
        let on_reject = completer.clone();

        let accepted = self.queue.push(Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(job))
                .map_err(|payload| PoolError::TaskPanicked(panic_message(&*payload)));
            completer.complete(outcome);
        }));

        if !accepted {
            on_reject.complete(Err(PoolError::ShutDown));
        }
        (accepted, handle)
    }

    /// Stops accepting jobs, lets the workers drain everything already
    /// queued, and blocks until they have exited.
    ///
    /// Only the first call does any work. Later or concurrent calls return
    /// immediately.
    ///
    /// Called from one of the pool's own jobs, it cannot wait for the
    /// calling worker: it returns once the others have exited and leaves the
    /// state at [`PoolState::ShuttingDown`].
    pub fn shutdown(&self) {
        if self
            .state
            .compare_exchange(RUNNING, SHUTTING_DOWN, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Thread pool is already shut down");
            return;
        }

        self.queue.close();
        debug!("Queue closed, draining {} queued jobs", self.queue.size());

        let workers = std::mem::take(
            &mut *self
                .workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let current = thread::current().id();
        let mut from_worker = false;
        for worker in workers {
            // Shut down by one of its own jobs; that worker exits on its own
            // once the queue is drained.
            if worker.thread().id() == current {
                from_worker = true;
                continue;
            }
            if worker.join().is_err() {
                error!("Worker thread panicked outside of a job");
            }
        }

        if from_worker {
            debug!("Thread pool shut down from a worker, not waiting for it");
            return;
        }
        self.state.store(STOPPED, Ordering::Release);
        debug!("Thread pool stopped");
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Number of jobs waiting to be picked up.
    pub fn queued(&self) -> usize {
        self.queue.size()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PoolState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => PoolState::Running,
            SHUTTING_DOWN => PoolState::ShuttingDown,
            _ => PoolState::Stopped,
        }
    }

    /// Whether the pool still accepts jobs.
    pub fn is_running(&self) -> bool {
        !self.queue.is_closed()
    }
}

/// Spawns a worker that executes jobs until the queue is closed and empty.
fn spawn_worker(id: usize, queue: Arc<BlockingQueue<Job>>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("pgrep-worker-{id}"))
        .spawn(move || {
            debug!("Worker {id} started");
            while let Some(job) = queue.pop() {
                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    error!("Worker {id} job panicked, continuing");
                }
            }
            debug!("Worker {id}: queue closed, shutting down");
        })
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
