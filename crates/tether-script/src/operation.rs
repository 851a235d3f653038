//! The invocable unit stored in the worker's registry.

use serde_json::{Map, Value};
use tether_protocol::{Arguments, Severity};
use thiserror::Error;

/// A named unit of behaviour invoked with an argument object.
///
/// Implemented for every closure of the matching shape, so native
/// operations need no wrapper type:
///
/// ```
/// use tether_script::{Arguments, InvocationContext, Operation, OperationError};
/// use serde_json::Value;
///
/// let echo = |args: &Arguments, _: &mut InvocationContext| -> Result<Value, OperationError> {
///     Ok(Value::Object(args.clone()))
/// };
/// let mut context = InvocationContext::new();
/// let value = echo.invoke(&Arguments::new(), &mut context).expect("echo succeeds");
/// assert!(value.as_object().is_some_and(serde_json::Map::is_empty));
/// ```
pub trait Operation {
    /// Runs the operation.
    ///
    /// Absent arguments are not an error at this level; the logic decides
    /// how to treat them.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] when the logic signals a failure.
    fn invoke(
        &self,
        args: &Arguments,
        context: &mut InvocationContext,
    ) -> Result<Value, OperationError>;
}

impl<F> Operation for F
where
    F: Fn(&Arguments, &mut InvocationContext) -> Result<Value, OperationError>,
{
    fn invoke(
        &self,
        args: &Arguments,
        context: &mut InvocationContext,
    ) -> Result<Value, OperationError> {
        self(args, context)
    }
}

/// Side output produced by an operation while it runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    /// A structured record for the host.
    Entity(Map<String, Value>),
    /// A log record, subject to the worker's severity threshold.
    Log {
        /// Severity of the record.
        severity: Severity,
        /// Message text.
        message: String,
    },
}

/// Collects the emissions of a single invocation in order.
#[derive(Debug, Default)]
pub struct InvocationContext {
    emissions: Vec<Emission>,
}

impl InvocationContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an entity.
    pub fn entity(&mut self, entity: Map<String, Value>) {
        self.push(Emission::Entity(entity));
    }

    /// Records a log message.
    pub fn log(&mut self, severity: Severity, message: impl Into<String>) {
        self.push(Emission::Log {
            severity,
            message: message.into(),
        });
    }

    /// Records an emission.
    pub fn push(&mut self, emission: Emission) {
        self.emissions.push(emission);
    }

    /// Returns the emissions recorded so far.
    #[must_use]
    pub fn emissions(&self) -> &[Emission] {
        &self.emissions
    }

    /// Consumes the context, returning its emissions in order.
    #[must_use]
    pub fn into_emissions(self) -> Vec<Emission> {
        self.emissions
    }
}

/// Failure signalled by an operation while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct OperationError {
    message: String,
    location: Option<String>,
    stack_trace: Option<String>,
}

impl OperationError {
    /// Creates an error with a description and no location or trace.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            stack_trace: None,
        }
    }

    /// Attaches the place the failure was raised.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Attaches a stack trace.
    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Returns the failure description.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the failure location, if known.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Returns the stack trace, if recorded.
    #[must_use]
    pub fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }
}
