//! A closable blocking queue and the worker pool built on it.
//!
//! Jobs are boxed closures pushed onto one shared FIFO queue. A fixed set
//! of workers pops and runs them until the queue is closed and drained.

mod blocking_queue;
mod shared_queue;
mod task_handle;

pub use self::blocking_queue::BlockingQueue;
pub use self::shared_queue::{PoolState, ThreadPool};
pub use self::task_handle::TaskHandle;
