use std::any::Any;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::{PoolError, Result};

/// Creates a connected completer/handle pair for one submission.
pub(crate) fn task_slot<T>() -> (Completer<T>, TaskHandle<T>) {
    let (tx, rx) = channel::bounded(1);
    (Completer { tx }, TaskHandle { rx })
}

/// Writing side of a result slot. Consumed on completion, so a slot can
/// be written at most once.
pub(crate) struct Completer<T> {
    tx: Sender<Result<T>>,
}

impl<T> Clone for Completer<T> {
    fn clone(&self) -> Self {
        Completer {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Completer<T> {
    pub(crate) fn complete(self, outcome: Result<T>) {
        // The reader may have dropped its handle; the outcome is then unwanted.
        let _ = self.tx.send(outcome);
    }
}

/// Reader for the outcome of a job passed to
/// [`ThreadPool::submit`](crate::ThreadPool::submit).
///
/// The outcome is delivered once. After `try_wait` or `wait_timeout` has
/// yielded it, later probes report [`PoolError::Canceled`].
#[must_use = "dropping a TaskHandle discards the task's outcome"]
pub struct TaskHandle<T> {
    rx: Receiver<Result<T>>,
}

impl<T> TaskHandle<T> {
    /// Blocks until the job completes, then yields its value or failure.
    pub fn wait(self) -> Result<T> {
        self.rx.recv().unwrap_or(Err(PoolError::Canceled))
    }

    /// Like `wait`, but gives up after `timeout` and returns `None`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(PoolError::Canceled)),
        }
    }

    /// Returns the outcome if the job has already completed.
    pub fn try_wait(&self) -> Option<Result<T>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(PoolError::Canceled)),
        }
    }
}

/// Extracts a readable message from a `catch_unwind` payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_slot_yields_value() {
        let (completer, handle) = task_slot();
        assert!(handle.try_wait().is_none());
        completer.complete(Ok(5));
        assert_eq!(handle.wait().unwrap(), 5);
    }

    #[test]
    fn dropped_completer_cancels() {
        let (completer, handle) = task_slot::<()>();
        drop(completer);
        assert!(matches!(handle.wait(), Err(PoolError::Canceled)));
    }

    #[test]
    fn panic_message_reads_common_payloads() {
        assert_eq!(panic_message(&"kek"), "kek");
        assert_eq!(panic_message(&String::from("lol")), "lol");
        assert_eq!(panic_message(&42_u32), "non-string panic payload");
    }
}
