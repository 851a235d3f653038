//! Named operation storage.
//!
//! The [`OperationRegistry`] maps operation names to invocable operations.
//! Installing under an existing name replaces the previous entry; there is no
//! removal. Entries live for the rest of the worker's run.

use std::collections::HashMap;
use std::fmt;

use tether_script::Operation;
use tracing::debug;

const REGISTRY_TARGET: &str = "tether_worker::registry";

/// Registry of operations available to the command loop.
///
/// # Example
///
/// ```
/// use serde_json::Value;
/// use tether_script::{Arguments, InvocationContext, OperationError};
/// use tether_worker::OperationRegistry;
///
/// let registry = OperationRegistry::new().with_operation(
///     "ping",
///     |_: &Arguments, _: &mut InvocationContext| -> Result<Value, OperationError> {
///         Ok(Value::from("pong"))
///     },
/// );
/// assert!(registry.contains("ping"));
/// ```
#[derive(Default)]
pub struct OperationRegistry {
    operations: HashMap<String, Box<dyn Operation>>,
}

impl OperationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a native operation, returning the registry for chaining.
    #[must_use]
    pub fn with_operation(
        mut self,
        name: impl Into<String>,
        operation: impl Operation + 'static,
    ) -> Self {
        self.install(name, Box::new(operation));
        self
    }

    /// Stores `operation` under `name`, replacing any existing entry.
    pub fn install(&mut self, name: impl Into<String>, operation: Box<dyn Operation>) {
        let name = name.into();
        let replaced = self.operations.insert(name.clone(), operation).is_some();
        debug!(target: REGISTRY_TARGET, operation = %name, replaced, "installed operation");
    }

    /// Looks up an operation by name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&dyn Operation> {
        self.operations.get(name).map(Box::as_ref)
    }

    /// Returns whether `name` is installed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Returns the installed names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of installed operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns whether no operations are installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.names())
            .finish()
    }
}
