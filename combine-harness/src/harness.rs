use std::time::Instant;

use futures::stream::{self, StreamExt};
use futures::{future, pin_mut};
use tracing::debug;

use crate::error::CombineError;
use crate::producer::DelayedProducer;

/// How [`combine`] awaits its two producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Await the first producer to completion before starting the second.
    Sequential,
    /// Fan both producers out onto the worker pool, then join the handles.
    Concurrent,
    /// Zip the producers together as single-item streams.
    StreamCombinator,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::Sequential,
        Strategy::Concurrent,
        Strategy::StreamCombinator,
    ];
}

/// Outcome of one [`combine`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    pub product: i64,
    pub elapsed_millis: u128,
}

/// Runs both producers under the selected strategy and multiplies their
/// values. Elapsed time is measured on a monotonic clock from just before the
/// first producer invocation to just after the combined value is available.
///
/// A failing producer fails the whole run with the same error kind;
/// Sequential never invokes the second producer after the first has failed,
/// while the concurrent strategies surface the failure once joined without
/// cancelling the still-running sibling.
pub async fn combine(
    strategy: Strategy,
    p1: DelayedProducer,
    p2: DelayedProducer,
) -> Result<ExecutionResult, CombineError> {
    debug!(?strategy, "combine started");
    let start = Instant::now();

    let product = match strategy {
        Strategy::Sequential => {
            let first = p1.produce().await?;
            let second = p2.produce().await?;
            first * second
        }
        Strategy::Concurrent => {
            let first = spawn_pool::spawn(p1.produce());
            let second = spawn_pool::spawn(p2.produce());
            let (first, second) = future::join(first, second).await;
            first?? * second??
        }
        Strategy::StreamCombinator => {
            let pair = stream::once(p1.produce()).zip(stream::once(p2.produce()));
            pin_mut!(pair);
            // zipping two one-item streams emits exactly one pair
            let (first, second) = pair.next().await.ok_or(CombineError::Cancelled)?;
            first? * second?
        }
    };

    let elapsed_millis = start.elapsed().as_millis();
    debug!(product, elapsed_millis, "combine finished");

    Ok(ExecutionResult {
        product,
        elapsed_millis,
    })
}
