//! # Engine Error Taxonomy
//!
//! Local, per-event failures are isolated and never abort a run; only
//! configuration errors are fatal at startup.

use thiserror::Error;

/// Errors surfaced by the scheduler API.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The bounded event queue is at capacity; the event was dropped.
    #[error("event queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// A malformed or unqueueable event; dropped, never retried.
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// Startup configuration validation failed. Fatal.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sigmasim_exec::ExecConfigError> for EngineError {
    fn from(err: sigmasim_exec::ExecConfigError) -> Self {
        EngineError::Config(err.to_string())
    }
}
