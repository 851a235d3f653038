//! The Tether worker.
//!
//! A host process drives the worker over a line-oriented JSON protocol. Each
//! line on standard input is a command naming an operation, optionally with
//! Lua logic to install under that name and an argument object. The worker
//! answers on standard output with `log`, `entity` and `result` events and
//! reports failures as `error` events on standard error.
//!
//! ```text
//! host -> {"cmd":"greet","def":"return 'hi ' .. args.name","args":{"name":"Ada"}}
//! host <- {"result":{"data":"hi Ada"}}
//! host -> {"cmd":"done"}
//! host <- {"log":{"severity":"info","message":"Finished",...}}
//! ```
//!
//! The crate is split along the path a line takes:
//!
//! - [`decoder`] turns raw lines into [`Command`]s;
//! - [`dispatcher`] installs logic into the [`OperationRegistry`] and invokes
//!   operations;
//! - [`emitter`] writes events, applying the log threshold;
//! - [`worker`] runs the lifecycle state machine over the three;
//! - [`bootstrap`] assembles a [`Worker`] from configuration.

pub mod bootstrap;
pub mod decoder;
pub mod dispatcher;
pub mod emitter;
mod errors;
pub mod registry;
mod telemetry;
pub mod worker;

pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, Worker, bootstrap_with,
    report_bootstrap_failure,
};
pub use decoder::{Command, CommandDecoder, DecodeFailure};
pub use dispatcher::{Dispatcher, Outcome};
pub use emitter::{Clock, Disposition, Emitter, ErrorReport, LogRecord, SystemClock};
pub use errors::{EmitError, FATAL_PROTOCOL_STATUS, INFRASTRUCTURE_STATUS, WorkerError};
pub use registry::OperationRegistry;
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use worker::{CommandLoop, LoopExit};

#[cfg(test)]
mod tests;
