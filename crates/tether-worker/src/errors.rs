//! Error types for the worker's infrastructure failures.
//!
//! Protocol errors (malformed input, unknown operations, failing logic) are
//! reported to the host as events and never surface here. The types below
//! cover the cases where the worker itself cannot carry on: an output stream
//! refuses a write, or input cannot be read.

use std::io;

use tether_protocol::EventStream;
use thiserror::Error;

/// Exit status after a fatal protocol error.
pub const FATAL_PROTOCOL_STATUS: u8 = 1;

/// Exit status when the worker cannot run.
pub const INFRASTRUCTURE_STATUS: u8 = 2;

/// Errors raised while writing an event.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The event could not be serialised.
    #[error("failed to serialise event: {0}")]
    Serialise(#[from] serde_json::Error),

    /// The serialised line could not be written or flushed.
    #[error("failed to write to the {stream:?} stream: {source}")]
    Write {
        /// Stream the line was destined for.
        stream: EventStream,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Errors that stop the command loop without a protocol outcome.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Reading the next input line failed.
    #[error("failed to read command input: {0}")]
    Read(#[source] io::Error),

    /// An event could not be emitted.
    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl WorkerError {
    /// Returns the process exit status for this error.
    ///
    /// Every infrastructure failure maps to the same status so the host can
    /// tell it apart from a reported protocol failure.
    #[must_use]
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Read(_) | Self::Emit(_) => INFRASTRUCTURE_STATUS,
        }
    }
}
