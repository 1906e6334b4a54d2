#![deny(missing_docs)]

//! Task execution core for a parallel grep.
//!
//! A closable, blocking, multi-producer/multi-consumer queue feeds a
//! fixed-size pool of worker threads. Jobs can be posted fire-and-forget
//! or submitted with a [`TaskHandle`] that delivers their value or panic.

/// Command-line options for the `pgrep` binary.
pub mod cli;
mod error;
/// Blocking queue and worker pool.
pub mod thread_pool;

pub use error::{PoolError, Result};
pub use thread_pool::{BlockingQueue, PoolState, TaskHandle, ThreadPool};
