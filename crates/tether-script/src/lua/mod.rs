//! Lua-backed [`ScriptEngine`].
//!
//! Logic text is a Lua 5.4 chunk body. The chunk runs with the argument
//! object bound to the local `args` (also available as `...`) and its first
//! return value, converted to JSON, is the operation's result:
//!
//! ```lua
//! return (args['1'] or '') .. ' ' .. (args['2'] or '')
//! ```
//!
//! The interpreter is sandboxed: only the `string`, `table`, `math`, `utf8`
//! and `coroutine` libraries are loaded, so logic cannot reach the
//! filesystem, processes or the host's streams. The global table `tether`
//! exposes two host helpers:
//!
//! - `tether.log(message [, severity])` records a log line (`info` unless
//!   another severity name is given);
//! - `tether.entity(table)` streams a structured record to the host.
//!
//! `print`, `dofile` and `loadfile` are removed from the base library: stdout
//! carries the protocol, and logic has no business reading files. `load`
//! only accepts source text and `string.dump` is gone, so precompiled
//! bytecode cannot be introduced. `error` raised with a table reports the
//! table as JSON, positioned like a string error.
//!
//! Every compiled operation shares one interpreter, so globals written by one
//! operation are visible to the next.

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use mlua::{Function, Lua, LuaOptions, LuaSerdeExt, StdLib, Table, Value as LuaValue};
use serde_json::Value;
use tether_protocol::{Arguments, Severity};
use tracing::debug;

use crate::engine::{CompileError, EngineError, ScriptEngine};
use crate::operation::{Emission, InvocationContext, Operation, OperationError};

/// Tracing target for interpreter activity.
const SCRIPT_TARGET: &str = "tether_script::lua";

/// Marker separating a Lua error message from its traceback.
const TRACEBACK_MARKER: &str = "\nstack traceback:";

/// Hardens the base library once the helpers are installed. Receives the
/// JSON encoder as its only argument.
const PRELUDE: &str = r#"
local encode = ...
local raw_load, raw_error = load, error
string.dump = nil
load = function(chunk, name, _, env)
  if env == nil then
    return raw_load(chunk, name, "t")
  end
  return raw_load(chunk, name, "t", env)
end
error = function(value, level)
  level = level or 1
  if type(value) ~= "string" and type(value) ~= "number" then
    value = encode(value) or tostring(value)
  end
  if level > 0 then
    level = level + 1
  end
  raw_error(value, level)
end
"#;

type EmissionBuffer = Rc<RefCell<Vec<Emission>>>;

/// Compiles host-supplied Lua into operations.
pub struct LuaEngine {
    lua: Rc<Lua>,
    emissions: EmissionBuffer,
}

impl LuaEngine {
    /// Creates a sandboxed interpreter with no memory limit.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the interpreter cannot be created.
    pub fn new() -> Result<Self, EngineError> {
        Self::with_memory_limit(None)
    }

    /// Creates a sandboxed interpreter, capping its heap at `limit` bytes
    /// when given.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the interpreter cannot be created or the
    /// limit cannot be applied.
    pub fn with_memory_limit(limit: Option<usize>) -> Result<Self, EngineError> {
        let libraries =
            StdLib::STRING | StdLib::TABLE | StdLib::MATH | StdLib::UTF8 | StdLib::COROUTINE;
        let lua = Lua::new_with(libraries, LuaOptions::default()).map_err(initialise_error)?;
        if let Some(bytes) = limit {
            lua.set_memory_limit(bytes).map_err(initialise_error)?;
        }

        let emissions = EmissionBuffer::default();
        register_helpers(&lua, &emissions).map_err(initialise_error)?;

        Ok(Self {
            lua: Rc::new(lua),
            emissions,
        })
    }
}

impl ScriptEngine for LuaEngine {
    fn compile(&self, name: &str, source: &str) -> Result<Box<dyn Operation>, CompileError> {
        // Kept on the first line so interpreter line numbers match the text.
        let chunk = format!("local args = ...; {source}");
        let function = self
            .lua
            .load(chunk.as_str())
            .set_name(format!("={name}"))
            .into_function()
            .map_err(|error| compile_error(name, &error))?;

        debug!(target: SCRIPT_TARGET, operation = name, "compiled lua operation");
        Ok(Box::new(LuaOperation {
            name: name.to_owned(),
            lua: Rc::clone(&self.lua),
            function,
            emissions: Rc::clone(&self.emissions),
        }))
    }
}

/// An operation compiled from Lua text.
struct LuaOperation {
    name: String,
    lua: Rc<Lua>,
    function: Function,
    emissions: EmissionBuffer,
}

impl LuaOperation {
    fn call(&self, args: &Arguments) -> Result<Value, OperationError> {
        let table = self
            .lua
            .to_value(args)
            .map_err(|error| self.runtime_error(&error))?;
        let returned: LuaValue = self
            .function
            .call(table)
            .map_err(|error| self.runtime_error(&error))?;
        self.lua.from_value(returned).map_err(|error| {
            OperationError::new(format!("result is not representable as JSON: {error}"))
        })
    }

    fn runtime_error(&self, error: &mlua::Error) -> OperationError {
        let (message, traceback) = describe(error);
        let mut failure = OperationError::new(message.clone());
        if let Some(location) = location_of(&self.name, &message) {
            failure = failure.with_location(location);
        }
        if let Some(trace) = traceback {
            failure = failure.with_stack_trace(trace);
        }
        failure
    }
}

impl Operation for LuaOperation {
    fn invoke(
        &self,
        args: &Arguments,
        context: &mut InvocationContext,
    ) -> Result<Value, OperationError> {
        self.emissions.borrow_mut().clear();
        let outcome = self.call(args);
        for emission in self.emissions.borrow_mut().drain(..) {
            context.push(emission);
        }
        outcome
    }
}

fn register_helpers(lua: &Lua, emissions: &EmissionBuffer) -> mlua::Result<()> {
    let helpers = lua.create_table()?;

    let sink = Rc::clone(emissions);
    let log = lua.create_function(move |_, (message, severity): (String, Option<String>)| {
        let severity = match severity {
            Some(name) => Severity::from_str(&name).map_err(|_| {
                mlua::Error::RuntimeError(format!("unknown log severity '{name}'"))
            })?,
            None => Severity::Info,
        };
        sink.borrow_mut().push(Emission::Log { severity, message });
        Ok(())
    })?;
    helpers.set("log", log)?;

    let sink = Rc::clone(emissions);
    let entity = lua.create_function(move |lua, record: Table| {
        match lua.from_value::<Value>(LuaValue::Table(record))? {
            Value::Object(fields) => {
                sink.borrow_mut().push(Emission::Entity(fields));
                Ok(())
            }
            other => Err(mlua::Error::RuntimeError(format!(
                "entity must be a table with string keys, got {other}"
            ))),
        }
    })?;
    helpers.set("entity", entity)?;

    let globals = lua.globals();
    for name in ["print", "dofile", "loadfile"] {
        globals.set(name, LuaValue::Nil)?;
    }
    globals.set("tether", helpers)?;

    let encode = lua.create_function(|lua, value: LuaValue| {
        Ok(lua
            .from_value::<Value>(value)
            .ok()
            .map(|json| json.to_string()))
    })?;
    lua.load(PRELUDE).set_name("=prelude").call::<()>(encode)
}

fn initialise_error(error: mlua::Error) -> EngineError {
    EngineError::Initialise {
        message: error.to_string(),
    }
}

fn compile_error(name: &str, error: &mlua::Error) -> CompileError {
    match error {
        mlua::Error::SyntaxError { message, .. } => CompileError::Syntax {
            name: name.to_owned(),
            message: message.clone(),
        },
        other => CompileError::Load {
            name: name.to_owned(),
            message: other.to_string(),
        },
    }
}

/// Splits an interpreter error into its message and optional traceback.
fn describe(error: &mlua::Error) -> (String, Option<String>) {
    match error {
        mlua::Error::RuntimeError(text) => split_traceback(text),
        mlua::Error::CallbackError { traceback, cause } => {
            let (message, _) = describe(cause);
            (message, Some(traceback.clone()))
        }
        other => split_traceback(&other.to_string()),
    }
}

fn split_traceback(text: &str) -> (String, Option<String>) {
    match text.split_once(TRACEBACK_MARKER) {
        Some((message, trace)) => (
            message.to_owned(),
            Some(format!("stack traceback:{trace}")),
        ),
        None => (text.to_owned(), None),
    }
}

/// Extracts `<name>:<line>` from a message shaped `<name>:<line>: ...`.
fn location_of(name: &str, message: &str) -> Option<String> {
    let rest = message.strip_prefix(name)?.strip_prefix(':')?;
    let (line, _) = rest.split_once(':')?;
    let is_line_number = !line.is_empty() && line.chars().all(|c| c.is_ascii_digit());
    is_line_number.then(|| format!("{name}:{line}"))
}
