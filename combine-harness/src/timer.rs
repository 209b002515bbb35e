use std::pin::Pin;
use std::sync::{Arc, Mutex, Weak};
use std::task::{Context, Poll, Waker};
use std::thread;
use std::time::Duration;

use futures::Future;

use crate::error::CombineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Waiting,
    Elapsed,
    Cancelled,
}

struct Shared {
    state: State,
    waker: Option<Waker>,
}

impl Shared {
    fn finish(&mut self, state: State) {
        self.state = state;
        // after the first poll a waker is stored
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }
}

// Flips a still-waiting timer to cancelled if its sleeper thread unwinds
// before marking it elapsed, so waiters are never stranded.
struct CancelGuard(Weak<Mutex<Shared>>);

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if let Some(shared) = self.0.upgrade() {
            let mut shared = shared.lock().unwrap();
            if shared.state == State::Waiting {
                shared.finish(State::Cancelled);
            }
        }
    }
}

/// One-shot timer backed by a dedicated sleeper thread. Awaiting it suspends
/// the task without blocking whatever is driving it; the sleeper wakes the
/// stored waker once the duration has passed.
pub struct Timer {
    shared: Arc<Mutex<Shared>>,
}

impl Timer {
    pub fn after(dur: Duration) -> Self {
        let shared = Arc::new(Mutex::new(Shared {
            state: State::Waiting,
            waker: None,
        }));

        let sleeper = Arc::downgrade(&shared);
        thread::spawn(move || {
            let _guard = CancelGuard(sleeper.clone());
            thread::sleep(dur);
            // the awaiting side may have dropped the timer mid-sleep
            if let Some(shared) = sleeper.upgrade() {
                shared.lock().unwrap().finish(State::Elapsed);
            }
        });

        Self { shared }
    }

    /// A timer whose sleeper is already gone; awaiting it resolves to
    /// [`CombineError::Cancelled`] immediately.
    pub fn cancelled() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                state: State::Cancelled,
                waker: None,
            })),
        }
    }
}

impl Future for Timer {
    type Output = Result<(), CombineError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut shared = self.shared.lock().unwrap();
        match shared.state {
            State::Waiting => {
                shared.waker = Some(cx.waker().clone());
                Poll::Pending
            }
            State::Elapsed => Poll::Ready(Ok(())),
            State::Cancelled => Poll::Ready(Err(CombineError::Cancelled)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use futures::executor::block_on;
    use futures::future;

    use super::*;

    #[test]
    fn elapses_no_earlier_than_its_duration() {
        let dur = Duration::from_millis(50);
        let start = Instant::now();
        block_on(Timer::after(dur)).unwrap();
        assert!(start.elapsed() >= dur);
    }

    #[test]
    fn cancelled_timer_fails_immediately() {
        assert_eq!(block_on(Timer::cancelled()), Err(CombineError::Cancelled));
    }

    #[test]
    fn sleeper_teardown_wakes_waiters_with_cancelled() {
        let shared = Arc::new(Mutex::new(Shared {
            state: State::Waiting,
            waker: None,
        }));
        let guard = CancelGuard(Arc::downgrade(&shared));
        drop(guard);
        assert_eq!(shared.lock().unwrap().state, State::Cancelled);
    }

    #[test]
    fn two_timers_sleep_concurrently() {
        let start = Instant::now();
        let (a, b) = block_on(future::join(
            Timer::after(Duration::from_millis(60)),
            Timer::after(Duration::from_millis(90)),
        ));
        a.unwrap();
        b.unwrap();
        assert!(start.elapsed() < Duration::from_millis(150));
    }
}
