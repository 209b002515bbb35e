use spawn_pool::JoinError;
use thiserror::Error;

/// The one failure kind the harness distinguishes: a producer's timer went
/// away before it elapsed. Anything else a producer raises would pass through
/// unchanged rather than be wrapped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CombineError {
    #[error("producer was cancelled before yielding a value")]
    Cancelled,
}

impl From<JoinError> for CombineError {
    fn from(err: JoinError) -> Self {
        match err {
            JoinError::Cancelled => CombineError::Cancelled,
        }
    }
}
