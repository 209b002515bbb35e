//! A small thread-pool executor with fan-out/fan-in support.
//!
//! [`spawn`] hands a future to a fixed pool of worker threads and returns a
//! [`JoinHandle`] that resolves with the future's output once it completes.
//! Joining several handles is the fan-in half of the pattern.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::thread;

use crossbeam::channel;
use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::task::{waker_ref, ArcWake};
use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::trace;

/// Failure to observe a spawned task's output.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    /// The task went away before it could deliver a result.
    #[error("task was cancelled before completing")]
    Cancelled,
}

static QUEUE: Lazy<channel::Sender<Arc<Task>>> = Lazy::new(|| {
    let (sender, receiver) = channel::unbounded::<Arc<Task>>();
    for id in 0..num_cpus::get().max(1) {
        let receiver = receiver.clone();
        thread::Builder::new()
            .name(format!("pool-worker-{id}"))
            .spawn(move || {
                trace!(worker = id, "pool worker started");
                receiver.iter().for_each(|task| task.run());
            })
            .expect("failed to spawn pool worker");
    }
    sender
});

const WOKEN: usize = 0b01;
const RUNNING: usize = 0b10;

struct Task {
    // each `Waker` holds a reference to its task, so the task is shared
    // across worker threads, and polling needs exclusive access to the
    // future, hence the `Mutex`.
    future: Mutex<BoxFuture<'static, ()>>,
    state: AtomicUsize,
}

impl Task {
    fn run(self: Arc<Task>) {
        let waker = waker_ref(&self);
        self.state.store(RUNNING, Ordering::SeqCst);
        let cx = &mut Context::from_waker(&waker);
        let poll = self.future.try_lock().unwrap().as_mut().poll(cx);
        if poll.is_pending()
            && self.state.fetch_and(!RUNNING, Ordering::SeqCst) == WOKEN | RUNNING
        {
            // a wake arrived while we were polling, requeue immediately
            QUEUE.send(self).unwrap();
        }
    }
}

impl ArcWake for Task {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        if arc_self.state.fetch_or(WOKEN, Ordering::SeqCst) == 0 {
            QUEUE.send(arc_self.clone()).unwrap();
        }
    }
}

/// Handle to a spawned task. Awaiting it yields the task's output, or
/// [`JoinError::Cancelled`] if the task was dropped without producing one.
pub struct JoinHandle<R> {
    receiver: oneshot::Receiver<R>,
}

impl<R> Future for JoinHandle<R> {
    type Output = Result<R, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|output| output.map_err(|_| JoinError::Cancelled))
    }
}

/// Queues `future` on the worker pool and returns a handle to its output.
pub fn spawn<F, R>(future: F) -> JoinHandle<R>
where
    F: Future<Output = R> + Send + 'static,
    R: Send + 'static,
{
    let (sender, receiver) = oneshot::channel();

    // route the output through a oneshot so the handle can await it
    let future = async move {
        let _ = sender.send(future.await);
    };

    let task = Arc::new(Task {
        future: Mutex::new(Box::pin(future)),
        state: AtomicUsize::default(),
    });

    QUEUE.send(task).expect("worker pool unavailable");

    JoinHandle { receiver }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use futures::future;

    use super::*;

    #[test]
    fn spawned_task_delivers_its_output() {
        let handle = spawn(async { 6 * 7 });
        assert_eq!(block_on(handle), Ok(42));
    }

    #[test]
    fn handles_join_in_any_order() {
        let a = spawn(async { "a" });
        let b = spawn(async { "b" });
        let (b, a) = block_on(future::join(b, a));
        assert_eq!((a, b), (Ok("a"), Ok("b")));
    }

    #[test]
    fn tasks_run_off_the_calling_thread() {
        let caller = thread::current().id();
        let handle = spawn(async move { thread::current().id() });
        let worker = block_on(handle).unwrap();
        assert_ne!(worker, caller);
    }

    #[test]
    fn handle_without_a_task_reports_cancelled() {
        // a handle whose sending side is gone can never resolve with a value
        let (sender, receiver) = oneshot::channel::<u32>();
        drop(sender);
        let handle = JoinHandle { receiver };
        assert_eq!(block_on(handle), Err(JoinError::Cancelled));
    }
}
