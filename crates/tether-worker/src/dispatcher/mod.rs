//! Command dispatch.
//!
//! The [`Dispatcher`] installs logic the host supplies and runs the operation
//! a command names. It classifies the result into an [`Outcome`] and leaves
//! reporting to the command loop.

use serde_json::Value;
use tether_script::{Emission, InvocationContext, OperationError, ScriptEngine};
use tracing::debug;

use crate::decoder::Command;
use crate::registry::OperationRegistry;

/// Tracing target for dispatch decisions.
pub(crate) const DISPATCH_TARGET: &str = "tether_worker::dispatch";

/// Result of dispatching one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The operation returned a value.
    Completed {
        /// Value returned by the operation.
        value: Value,
        /// Entities and logs produced while it ran, in order.
        emissions: Vec<Emission>,
    },
    /// No operation is installed under the name and no logic was supplied.
    DefinitionNotFound {
        /// Requested operation name.
        name: String,
    },
    /// Compiling or running the logic failed.
    ExecutionFailed {
        /// Requested operation name.
        name: String,
        /// Failure raised by the engine or the logic.
        error: OperationError,
        /// Entities and logs produced before the failure, in order.
        emissions: Vec<Emission>,
    },
}

/// Installs and invokes operations.
pub struct Dispatcher<S> {
    engine: S,
    registry: OperationRegistry,
}

impl<S: ScriptEngine> Dispatcher<S> {
    /// Creates a dispatcher with an empty registry.
    #[must_use]
    pub fn new(engine: S) -> Self {
        Self::with_registry(engine, OperationRegistry::new())
    }

    /// Creates a dispatcher over a pre-populated registry.
    #[must_use]
    pub const fn with_registry(engine: S, registry: OperationRegistry) -> Self {
        Self { engine, registry }
    }

    /// Returns the registry.
    #[must_use]
    pub const fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Installs the command's logic when present, then invokes the named
    /// operation with the command's arguments.
    ///
    /// Logic that fails to compile leaves the registry unchanged and is
    /// reported as [`Outcome::ExecutionFailed`].
    pub fn dispatch(&mut self, command: &Command) -> Outcome {
        let name = command.operation();

        if let Some(source) = command.definition() {
            match self.engine.compile(name, source) {
                Ok(operation) => self.registry.install(name, operation),
                Err(error) => {
                    debug!(target: DISPATCH_TARGET, operation = name, %error, "logic rejected");
                    return Outcome::ExecutionFailed {
                        name: name.to_owned(),
                        error: OperationError::new(error.to_string()),
                        emissions: Vec::new(),
                    };
                }
            }
        }

        let Some(operation) = self.registry.resolve(name) else {
            debug!(target: DISPATCH_TARGET, operation = name, "operation not installed");
            return Outcome::DefinitionNotFound {
                name: name.to_owned(),
            };
        };

        debug!(target: DISPATCH_TARGET, operation = name, "invoking operation");
        let mut context = InvocationContext::new();
        match operation.invoke(command.arguments(), &mut context) {
            Ok(value) => Outcome::Completed {
                value,
                emissions: context.into_emissions(),
            },
            Err(error) => {
                debug!(target: DISPATCH_TARGET, operation = name, %error, "operation failed");
                Outcome::ExecutionFailed {
                    name: name.to_owned(),
                    error,
                    emissions: context.into_emissions(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
