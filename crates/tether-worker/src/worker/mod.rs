//! The command loop.
//!
//! [`CommandLoop`] drives the worker's lifecycle:
//!
//! ```text
//! Starting -> Listening -> (Executing)* -> Stopping -> Stopped
//!                  \______________\_______-> FatalExit
//! ```
//!
//! One input line is read, decoded, dispatched and its outcome written
//! before the next line is read. Malformed lines are reported and skipped.
//! Missing definitions and failing logic are reported and end the loop with
//! [`LoopExit::Fatal`].

use std::io::BufRead;
use std::process::ExitCode;

use tether_script::{Emission, OperationError, ScriptEngine};
use tracing::debug;

use crate::decoder::{Command, CommandDecoder};
use crate::dispatcher::{Dispatcher, Outcome};
use crate::emitter::{Clock, Disposition, Emitter, ErrorReport, LogRecord, SystemClock};
use crate::errors::{FATAL_PROTOCOL_STATUS, WorkerError};

/// Tracing target for lifecycle transitions.
const LOOP_TARGET: &str = "tether_worker::loop";

/// How the command loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The terminator arrived or input ended.
    Finished,
    /// A fatal protocol error was reported.
    Fatal,
}

impl LoopExit {
    /// Maps the exit to a process status.
    #[must_use]
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Finished => ExitCode::SUCCESS,
            Self::Fatal => ExitCode::from(FATAL_PROTOCOL_STATUS),
        }
    }
}

#[derive(Debug)]
enum State {
    Starting,
    Listening,
    Executing(Command),
    Stopping,
    Stopped,
    FatalExit,
}

impl State {
    const fn name(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Listening => "listening",
            Self::Executing(_) => "executing",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::FatalExit => "fatal_exit",
        }
    }
}

/// Reads commands from the host and writes their outcomes.
pub struct CommandLoop<S, O, E, C = SystemClock> {
    decoder: CommandDecoder,
    dispatcher: Dispatcher<S>,
    emitter: Emitter<O, E, C>,
}

impl<S, O, E, C> CommandLoop<S, O, E, C>
where
    S: ScriptEngine,
    O: std::io::Write,
    E: std::io::Write,
    C: Clock,
{
    /// Assembles a loop from its parts.
    #[must_use]
    pub const fn new(
        decoder: CommandDecoder,
        dispatcher: Dispatcher<S>,
        emitter: Emitter<O, E, C>,
    ) -> Self {
        Self {
            decoder,
            dispatcher,
            emitter,
        }
    }

    /// Runs until the terminator, end of input or a fatal protocol error.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError`] when input cannot be read or an event cannot
    /// be written. Protocol failures are reported to the host and surface as
    /// [`LoopExit::Fatal`] instead.
    pub fn run(&mut self, input: &mut impl BufRead) -> Result<LoopExit, WorkerError> {
        let mut state = State::Starting;
        loop {
            debug!(target: LOOP_TARGET, state = state.name(), "entering state");
            state = match state {
                State::Starting => {
                    self.emitter.log(LogRecord::new("Starting"))?;
                    State::Listening
                }
                State::Listening => self.listen(input)?,
                State::Executing(command) => self.execute(&command)?,
                State::Stopping => {
                    self.emitter.log(LogRecord::new("Finished"))?;
                    State::Stopped
                }
                State::Stopped => return Ok(LoopExit::Finished),
                State::FatalExit => return Ok(LoopExit::Fatal),
            };
        }
    }

    /// Consumes the loop, returning its emitter.
    #[must_use]
    pub fn into_emitter(self) -> Emitter<O, E, C> {
        self.emitter
    }

    fn listen(&mut self, input: &mut impl BufRead) -> Result<State, WorkerError> {
        let mut bytes = Vec::new();
        let read = input
            .read_until(b'\n', &mut bytes)
            .map_err(WorkerError::Read)?;
        if read == 0 {
            debug!(target: LOOP_TARGET, "input exhausted");
            return Ok(State::Stopping);
        }

        let line = String::from_utf8_lossy(&bytes);
        let command = match self.decoder.decode(&line) {
            Ok(command) => command,
            Err(failure) => {
                let disposition = self.emitter.error(ErrorReport::new(failure.to_string()))?;
                return Ok(Self::after_error(disposition));
            }
        };

        if command.is_terminator() {
            return Ok(State::Stopping);
        }
        if command.definition().is_none()
            && !self.dispatcher.registry().contains(command.operation())
        {
            return self.not_found(command.operation());
        }
        Ok(State::Executing(command))
    }

    fn execute(&mut self, command: &Command) -> Result<State, WorkerError> {
        match self.dispatcher.dispatch(command) {
            Outcome::Completed { value, emissions } => {
                self.forward(emissions)?;
                self.emitter.result(value)?;
                Ok(State::Listening)
            }
            Outcome::DefinitionNotFound { name } => self.not_found(&name),
            Outcome::ExecutionFailed {
                name,
                error,
                emissions,
            } => {
                self.forward(emissions)?;
                self.execution_failed(&name, &error)
            }
        }
    }

    fn forward(&mut self, emissions: Vec<Emission>) -> Result<(), WorkerError> {
        for emission in emissions {
            match emission {
                Emission::Entity(entity) => self.emitter.entity(entity)?,
                Emission::Log { severity, message } => self
                    .emitter
                    .log(LogRecord::new(message).with_severity(severity))?,
            }
        }
        Ok(())
    }

    fn not_found(&mut self, name: &str) -> Result<State, WorkerError> {
        let report =
            ErrorReport::new(format!("Function definition for '{name}' not found")).terminating();
        Ok(Self::after_error(self.emitter.error(report)?))
    }

    fn execution_failed(
        &mut self,
        name: &str,
        error: &OperationError,
    ) -> Result<State, WorkerError> {
        let mut report =
            ErrorReport::new(format!("Could not execute {name}: {}", error.message())).terminating();
        if let Some(location) = error.location() {
            report = report.with_location(location);
        }
        if let Some(trace) = error.stack_trace() {
            report = report.with_stack_trace(trace);
        }
        Ok(Self::after_error(self.emitter.error(report)?))
    }

    const fn after_error(disposition: Disposition) -> State {
        match disposition {
            Disposition::Continue => State::Listening,
            Disposition::Terminate => State::FatalExit,
        }
    }
}
