//! The boundary between the worker and an interpreter.

use thiserror::Error;

use crate::operation::Operation;

/// Builds operations from logic text supplied by the host.
///
/// Implementations own whatever runtime the text needs. The worker calls
/// [`ScriptEngine::compile`] once per `def` it receives and stores the
/// returned operation under the command's name.
pub trait ScriptEngine {
    /// Compiles `source` into an operation named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] when the text is rejected.
    fn compile(&self, name: &str, source: &str) -> Result<Box<dyn Operation>, CompileError>;
}

/// Errors raised while compiling logic text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The text is not syntactically valid.
    #[error("syntax error in '{name}': {message}")]
    Syntax {
        /// Operation name.
        name: String,
        /// Interpreter diagnostic.
        message: String,
    },
    /// The interpreter refused the text for another reason.
    #[error("failed to load '{name}': {message}")]
    Load {
        /// Operation name.
        name: String,
        /// Interpreter diagnostic.
        message: String,
    },
}

/// Errors raised while preparing an interpreter.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The runtime could not be created or configured.
    #[error("failed to initialise script runtime: {message}")]
    Initialise {
        /// Interpreter diagnostic.
        message: String,
    },
}
