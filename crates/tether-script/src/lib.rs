//! Operation logic for the Tether worker.
//!
//! The worker's command loop stores and invokes operations without knowing
//! how they were built. This crate draws that boundary: an [`Operation`] is
//! anything that maps an argument object to a JSON value, and a
//! [`ScriptEngine`] turns logic text sent by the host into an operation.
//!
//! Two kinds of operation exist:
//!
//! - **native** operations, any closure with the [`Operation`] signature,
//!   registered by the embedding program before the loop starts;
//! - **scripted** operations, compiled from host-supplied Lua by
//!   [`LuaEngine`].
//!
//! While running, an operation may stream entities and log records through
//! its [`InvocationContext`]; the loop writes them before the operation's
//! result.
//!
//! # Example
//!
//! ```
//! use tether_script::{Arguments, InvocationContext, LuaEngine, ScriptEngine};
//!
//! let engine = LuaEngine::new().expect("interpreter starts");
//! let operation = engine
//!     .compile("greet", "return 'hello ' .. (args.name or '')")
//!     .expect("logic compiles");
//!
//! let mut args = Arguments::new();
//! args.insert("name".into(), "Ada".into());
//! let mut context = InvocationContext::new();
//! let value = operation.invoke(&args, &mut context).expect("logic runs");
//! assert_eq!(value, serde_json::json!("hello Ada"));
//! ```

pub mod engine;
pub mod lua;
pub mod operation;

pub use self::engine::{CompileError, EngineError, ScriptEngine};
pub use self::lua::LuaEngine;
pub use self::operation::{Emission, InvocationContext, Operation, OperationError};
pub use tether_protocol::Arguments;
