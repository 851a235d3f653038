//! Worker bootstrap orchestration.
//!
//! Loads configuration, initialises diagnostics and prepares the script
//! engine. Anything that fails here happens before the first protocol event,
//! so [`report_bootstrap_failure`] writes a single error event for the host
//! before the process exits.

use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use ortho_config::OrthoError;
use tether_config::Config;
use tether_script::{EngineError, LuaEngine, Operation};
use thiserror::Error;
use tracing::{debug, warn};

use crate::decoder::CommandDecoder;
use crate::dispatcher::Dispatcher;
use crate::emitter::{Emitter, ErrorReport};
use crate::errors::{INFRASTRUCTURE_STATUS, WorkerError};
use crate::registry::OperationRegistry;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::worker::{CommandLoop, LoopExit};

const BOOTSTRAP_TARGET: &str = "tether_worker::bootstrap";

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the worker configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that returns a fixed configuration.
#[derive(Debug, Default, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Creates a loader that always yields `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The script runtime could not be prepared.
    #[error("failed to prepare script engine: {source}")]
    Engine {
        /// Underlying engine error.
        #[source]
        source: EngineError,
    },
}

/// A worker ready to serve the host.
pub struct Worker {
    config: Config,
    telemetry: TelemetryHandle,
    engine: LuaEngine,
    registry: OperationRegistry,
}

impl Worker {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Pre-installs a native operation the host may call without sending a
    /// definition.
    #[must_use]
    pub fn with_operation(
        mut self,
        name: impl Into<String>,
        operation: impl Operation + 'static,
    ) -> Self {
        self.registry = self.registry.with_operation(name, operation);
        self
    }

    /// Serves commands from `input` until the session ends.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError`] when input cannot be read or an event cannot
    /// be written.
    pub fn run<O, E>(
        self,
        input: &mut impl BufRead,
        primary: O,
        errors: E,
    ) -> Result<LoopExit, WorkerError>
    where
        O: Write,
        E: Write,
    {
        let decoder = CommandDecoder::new(self.config.terminator());
        let dispatcher = Dispatcher::with_registry(self.engine, self.registry);
        let emitter = Emitter::new(primary, errors, self.config.log_severity());
        let exit = CommandLoop::new(decoder, dispatcher, emitter).run(input)?;
        debug!(target: BOOTSTRAP_TARGET, ?exit, "command loop ended");
        Ok(exit)
    }
}

/// Bootstraps the worker using the supplied configuration loader.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry or the script
/// engine cannot be prepared.
pub fn bootstrap_with(loader: &dyn ConfigLoader) -> Result<Worker, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    let engine = LuaEngine::with_memory_limit(config.script_memory_limit())
        .map_err(|source| BootstrapError::Engine { source })?;

    debug!(
        target: BOOTSTRAP_TARGET,
        terminator = config.terminator(),
        threshold = %config.log_severity(),
        "worker bootstrapped"
    );
    Ok(Worker {
        config,
        telemetry,
        engine,
        registry: OperationRegistry::new(),
    })
}

/// Reports a bootstrap failure to the host and returns the exit status.
///
/// The failure is written as a terminating error event; if even that write
/// fails there is nothing left to tell the host.
pub fn report_bootstrap_failure(
    error: &BootstrapError,
    primary: impl Write,
    errors: impl Write,
) -> ExitCode {
    warn!(target: BOOTSTRAP_TARGET, %error, "bootstrap failed");
    let mut emitter = Emitter::new(primary, errors, Config::default().log_severity());
    if let Err(emit_error) = emitter.error(ErrorReport::new(error.to_string()).terminating()) {
        warn!(target: BOOTSTRAP_TARGET, %emit_error, "could not report bootstrap failure");
    }
    ExitCode::from(INFRASTRUCTURE_STATUS)
}
