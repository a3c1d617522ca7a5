// Copyright (c) 2024-present, simple-storage contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use futures::channel::oneshot;
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    task::{Context, Poll},
};

/// Signals that pending asynchronous operations should not start
///
/// Clones share the same state. Cancellation is only checked when an
/// operation is started: work that is already running is not interrupted.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

enum State<T> {
    Done(Option<crate::Result<T>>),
    Running(oneshot::Receiver<crate::Result<T>>),
}

/// Result of an asynchronous storage operation
///
/// The work runs on its own worker thread, so the future does not need
/// to be polled for the operation to make progress. Any executor can
/// drive it.
#[must_use = "futures do nothing unless awaited, but the operation runs regardless"]
pub struct Task<T>(State<T>);

// NOTE: The task never pins its contents
impl<T> Unpin for Task<T> {}

impl<T> Task<T> {
    /// A task that already finished, without spawning any work
    pub(crate) fn ready(result: crate::Result<T>) -> Self {
        Self(State::Done(Some(result)))
    }
}

impl<T: Send + 'static> Task<T> {
    /// Runs `f` on a new worker thread.
    pub(crate) fn spawn<F>(f: F) -> Self
    where
        F: FnOnce() -> crate::Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        let spawned = std::thread::Builder::new()
            .name("storage-worker".into())
            .spawn(move || {
                // NOTE: The receiver may have been dropped, nobody is interested in the result then
                let _ = tx.send(f());
            });

        match spawned {
            Ok(_) => Self(State::Running(rx)),
            Err(e) => Self::ready(Err(e.into())),
        }
    }
}

impl<T> Future for Task<T> {
    type Output = crate::Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().0 {
            State::Done(result) => Poll::Ready(result.take().unwrap_or_else(|| {
                Err(crate::Error::Io(std::io::Error::other(
                    "task polled after completion",
                )))
            })),
            State::Running(rx) => match Pin::new(rx).poll(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(crate::Error::Io(
                    std::io::Error::other("storage worker terminated without a result"),
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use test_log::test;

    #[test]
    fn task_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn task_runs_off_thread() -> crate::Result<()> {
        let caller = std::thread::current().id();
        let worker = block_on(Task::spawn(|| Ok(std::thread::current().id())))?;
        assert_ne!(caller, worker);
        Ok(())
    }

    #[test]
    fn task_ready() {
        assert!(matches!(
            block_on(Task::<()>::ready(Err(crate::Error::Cancelled))),
            Err(crate::Error::Cancelled)
        ));
    }

    #[test]
    fn task_worker_panic() {
        let task = Task::<()>::spawn(|| panic!("worker failed"));
        assert!(matches!(block_on(task), Err(crate::Error::Io(_))));
    }
}
