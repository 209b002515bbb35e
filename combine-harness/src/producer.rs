use std::time::Duration;

use tracing::debug;

use crate::error::CombineError;
use crate::timer::Timer;

/// An asynchronous unit of work: after a fixed latency, yields a fixed
/// integer. Pure and stateless, so instances are freely copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayedProducer {
    delay: Duration,
    value: i64,
    fail_fast: bool,
}

/// Produces 10 after one second.
pub const TEN_AFTER_1S: DelayedProducer = DelayedProducer::new(1000, 10);

/// Produces 20 after two seconds.
pub const TWENTY_AFTER_2S: DelayedProducer = DelayedProducer::new(2000, 20);

impl DelayedProducer {
    pub const fn new(delay_ms: u64, value: i64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            value,
            fail_fast: false,
        }
    }

    /// A producer whose timer fails immediately instead of sleeping.
    pub const fn failing(value: i64) -> Self {
        Self {
            delay: Duration::ZERO,
            value,
            fail_fast: true,
        }
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    pub const fn value(&self) -> i64 {
        self.value
    }

    /// Suspends the calling task for the configured delay, then resolves with
    /// the configured value. Other tasks keep running while this one is
    /// parked on the timer.
    pub async fn produce(self) -> Result<i64, CombineError> {
        let timer = if self.fail_fast {
            Timer::cancelled()
        } else {
            Timer::after(self.delay)
        };
        timer.await?;
        debug!(value = self.value, "producer resolved");
        Ok(self.value)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use futures::executor::block_on;

    use super::*;

    #[test]
    fn yields_its_value_after_the_delay() {
        let producer = DelayedProducer::new(50, 7);
        let start = Instant::now();
        assert_eq!(block_on(producer.produce()), Ok(7));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn failing_producer_never_yields() {
        let start = Instant::now();
        assert_eq!(
            block_on(DelayedProducer::failing(7).produce()),
            Err(CombineError::Cancelled)
        );
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn canonical_producers_keep_their_constants() {
        assert_eq!(TEN_AFTER_1S.value(), 10);
        assert_eq!(TEN_AFTER_1S.delay(), Duration::from_millis(1000));
        assert_eq!(TWENTY_AFTER_2S.value(), 20);
        assert_eq!(TWENTY_AFTER_2S.delay(), Duration::from_millis(2000));
    }
}
