//! Dispatcher error types.

use thiserror::Error;

/// Errors that can occur while dispatching BFS queries.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Concurrency bound was zero or negative; no work was started.
    #[error("invalid max_concurrency: {0} (must be a positive integer)")]
    InvalidConcurrency(i64),

    /// A worker or traversal task panicked, was aborted, or lost its
    /// admission slot.
    #[error("worker task failed: {0}")]
    WorkerPanicked(String),

    /// A worker could not publish because the collector stopped receiving.
    #[error("result collector closed before all workers finished")]
    CollectorClosed,

    /// Runtime construction failed in the blocking entry point.
    #[error("failed to build tokio runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl DispatchError {
    /// Check if this error was raised by configuration validation, i.e. before
    /// any task was launched.
    pub fn is_config_error(&self) -> bool {
        matches!(self, DispatchError::InvalidConcurrency(_))
    }
}

impl From<tokio::task::JoinError> for DispatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        DispatchError::WorkerPanicked(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DispatchError::InvalidConcurrency(-1);
        assert!(err.to_string().contains("-1"));

        let err = DispatchError::WorkerPanicked("boom".into());
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn config_errors() {
        assert!(DispatchError::InvalidConcurrency(0).is_config_error());
        assert!(!DispatchError::CollectorClosed.is_config_error());
        assert!(!DispatchError::WorkerPanicked("x".into()).is_config_error());
    }
}
