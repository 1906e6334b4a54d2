use std::io;
use thiserror::Error;

/// Error type for thread pool operations.
#[derive(Error, Debug)]
pub enum PoolError {
    /// The submission arrived after shutdown began and was never run.
    #[error("thread pool is shut down")]
    ShutDown,

    /// The submitted callable panicked; carries the panic message.
    #[error("task panicked: {0}")]
    TaskPanicked(String),

    /// The job was dropped before it completed its result handle.
    #[error("task was dropped before completion")]
    Canceled,

    /// The worker list for the requested pool size could not be allocated.
    #[error("cannot allocate {0} workers")]
    TooManyWorkers(usize),

    /// IO error from spawning a worker thread.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for thread pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;
