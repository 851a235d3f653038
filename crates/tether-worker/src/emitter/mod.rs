//! Event emission for the command loop.
//!
//! The [`Emitter`] owns both output streams and the protocol log threshold.
//! Every event is serialised as one JSON line, newline-terminated and flushed
//! immediately so the host sees progress as it happens. Errors are written
//! twice: once to the error stream and once as an `error` log on the primary
//! stream.
//!
//! The emitter never decides control flow. A terminating error yields
//! [`Disposition::Terminate`] and the caller chooses how to stop.

use std::io::Write;

use serde_json::{Map, Value};
use tether_protocol::{ErrorEvent, Event, EventStream, LogEvent, Severity};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::errors::EmitError;

/// Source of event timestamps.
pub trait Clock {
    /// Returns the current time as an RFC 3339 string.
    fn now(&self) -> String;
}

/// Wall-clock time in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        let now = OffsetDateTime::now_utc();
        now.format(&Rfc3339)
            .unwrap_or_else(|_| now.unix_timestamp().to_string())
    }
}

/// What the caller should do after an error has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The error was recoverable; keep going.
    Continue,
    /// The error was fatal; stop processing input.
    Terminate,
}

/// A protocol log line waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    message: String,
    severity: Severity,
    timestamp: Option<String>,
    stack_trace: String,
}

impl LogRecord {
    /// Creates an `info` record stamped at emission time.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
            timestamp: None,
            stack_trace: String::new(),
        }
    }

    /// Sets the severity.
    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Uses `timestamp` instead of the emitter's clock.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Attaches a stack trace.
    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = stack_trace.into();
        self
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }
}

/// An error waiting to be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    message: String,
    timestamp: Option<String>,
    location: String,
    stack_trace: String,
    terminating: bool,
}

impl ErrorReport {
    /// Creates a recoverable report stamped at emission time.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: None,
            location: String::new(),
            stack_trace: String::new(),
            terminating: false,
        }
    }

    /// Uses `timestamp` instead of the emitter's clock.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Records where the failure was raised.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Attaches a stack trace.
    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = stack_trace.into();
        self
    }

    /// Marks the report as fatal.
    #[must_use]
    pub const fn terminating(mut self) -> Self {
        self.terminating = true;
        self
    }

    /// Returns the message text.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns whether the report is fatal.
    #[must_use]
    pub const fn is_terminating(&self) -> bool {
        self.terminating
    }
}

/// Writes protocol events to the worker's output streams.
pub struct Emitter<O, E, C = SystemClock> {
    primary: O,
    errors: E,
    threshold: Severity,
    clock: C,
}

impl<O: Write, E: Write> Emitter<O, E> {
    /// Creates an emitter stamping events with the system clock.
    #[must_use]
    pub fn new(primary: O, errors: E, threshold: Severity) -> Self {
        Self::with_clock(primary, errors, threshold, SystemClock)
    }
}

impl<O: Write, E: Write, C: Clock> Emitter<O, E, C> {
    /// Creates an emitter using `clock` for timestamps.
    #[must_use]
    pub fn with_clock(primary: O, errors: E, threshold: Severity, clock: C) -> Self {
        Self {
            primary,
            errors,
            threshold,
            clock,
        }
    }

    /// Returns the minimum severity written by [`Emitter::log`].
    #[must_use]
    pub const fn threshold(&self) -> Severity {
        self.threshold
    }

    /// Writes a log line if its severity reaches the threshold.
    ///
    /// Records below the threshold are dropped without touching either
    /// stream.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError`] if the line cannot be serialised or written.
    pub fn log(&mut self, record: LogRecord) -> Result<(), EmitError> {
        if !record.severity.passes(self.threshold) {
            return Ok(());
        }
        let time = record.timestamp.unwrap_or_else(|| self.clock.now());
        let event = Event::Log(LogEvent::new(
            record.severity,
            record.message,
            time,
            record.stack_trace,
        ));
        self.write_event(&event)
    }

    /// Writes an operation's return value. Never filtered.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError`] if the line cannot be serialised or written.
    pub fn result(&mut self, data: Value) -> Result<(), EmitError> {
        self.write_event(&Event::result(data))
    }

    /// Writes a structured record streamed by an operation. Never filtered.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError`] if the line cannot be serialised or written.
    pub fn entity(&mut self, entity: Map<String, Value>) -> Result<(), EmitError> {
        self.write_event(&Event::Entity(entity))
    }

    /// Reports an error on the error stream and logs it at `error` severity.
    ///
    /// Both lines share the report's timestamp and stack trace.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError`] if either line cannot be serialised or written.
    pub fn error(&mut self, report: ErrorReport) -> Result<Disposition, EmitError> {
        let time = report.timestamp.unwrap_or_else(|| self.clock.now());
        let event = Event::Error(ErrorEvent::new(
            report.message.as_str(),
            time.as_str(),
            report.location,
            report.stack_trace.as_str(),
        ));
        self.write_event(&event)?;
        self.log(
            LogRecord::new(report.message)
                .with_severity(Severity::Error)
                .with_timestamp(time)
                .with_stack_trace(report.stack_trace),
        )?;

        Ok(if report.terminating {
            Disposition::Terminate
        } else {
            Disposition::Continue
        })
    }

    /// Consumes the emitter, returning the primary and error streams.
    #[must_use]
    pub fn into_inner(self) -> (O, E) {
        (self.primary, self.errors)
    }

    fn write_event(&mut self, event: &Event) -> Result<(), EmitError> {
        let line = event.to_line()?;
        let stream = event.stream();
        let result = match stream {
            EventStream::Primary => write_line(&mut self.primary, &line),
            EventStream::Error => write_line(&mut self.errors, &line),
        };
        result.map_err(|source| EmitError::Write { stream, source })
    }
}

fn write_line(writer: &mut impl Write, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

#[cfg(test)]
mod tests;
