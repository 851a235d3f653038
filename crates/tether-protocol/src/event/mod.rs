//! Events written by the worker.
//!
//! Each event serialises to a single-key JSON object naming its kind. Logs,
//! results and entities travel on the primary stream (stdout); errors travel
//! on the error stream (stderr). Field order inside each object is fixed by
//! the declaration order below and is part of the wire contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::severity::Severity;

/// Output stream an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStream {
    /// Standard output: logs, results and entities.
    Primary,
    /// Standard error: error reports.
    Error,
}

/// An event line written by the worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// A log message.
    Log(LogEvent),
    /// The value returned by an operation.
    Result(ResultEvent),
    /// An error report.
    Error(ErrorEvent),
    /// A structured record streamed by an operation while it runs.
    Entity(Map<String, Value>),
}

impl Event {
    /// Wraps an operation's return value in a result event.
    #[must_use]
    pub const fn result(data: Value) -> Self {
        Self::Result(ResultEvent { data })
    }

    /// Returns the stream this event is written to.
    #[must_use]
    pub const fn stream(&self) -> EventStream {
        match self {
            Self::Error(_) => EventStream::Error,
            Self::Log(_) | Self::Result(_) | Self::Entity(_) => EventStream::Primary,
        }
    }

    /// Serialises the event as one JSON line without the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if serialisation fails.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Payload of a `log` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    severity: Severity,
    message: String,
    time: String,
    stack_trace: String,
}

impl LogEvent {
    /// Creates a log payload.
    #[must_use]
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        time: impl Into<String>,
        stack_trace: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            time: time.into(),
            stack_trace: stack_trace.into(),
        }
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the message text.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the timestamp.
    #[must_use]
    pub const fn time(&self) -> &str {
        self.time.as_str()
    }

    /// Returns the stack trace, empty when none was recorded.
    #[must_use]
    pub const fn stack_trace(&self) -> &str {
        self.stack_trace.as_str()
    }
}

/// Payload of a `result` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultEvent {
    data: Value,
}

impl ResultEvent {
    /// Returns the returned value.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }
}

/// Payload of an `error` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    message: String,
    time: String,
    location: String,
    stack_trace: String,
}

impl ErrorEvent {
    /// Creates an error payload.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        time: impl Into<String>,
        location: impl Into<String>,
        stack_trace: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            time: time.into(),
            location: location.into(),
            stack_trace: stack_trace.into(),
        }
    }

    /// Returns the message text.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the timestamp.
    #[must_use]
    pub const fn time(&self) -> &str {
        self.time.as_str()
    }

    /// Returns the failure location, empty when unknown.
    #[must_use]
    pub const fn location(&self) -> &str {
        self.location.as_str()
    }

    /// Returns the stack trace, empty when none was recorded.
    #[must_use]
    pub const fn stack_trace(&self) -> &str {
        self.stack_trace.as_str()
    }
}
