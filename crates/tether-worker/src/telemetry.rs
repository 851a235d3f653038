//! Internal diagnostics for the worker.
//!
//! Both standard streams carry the protocol, so diagnostics go to the file
//! named by `diagnostics_file` and nowhere else. Without a file no subscriber
//! is installed and `tracing` events are discarded.

use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use tether_config::{Config, LogFormat};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured filter expression.
    #[error("invalid diagnostics filter: {0}")]
    Filter(String),
    /// Failed to open the diagnostics file.
    #[error("failed to open diagnostics file '{path}': {source}")]
    File {
        /// Configured file path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Repeated calls are idempotent: only the first invocation touches global
/// state.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid, the diagnostics
/// file cannot be opened, or another subscriber is already installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| match config.diagnostics_file() {
            Some(path) => install_subscriber(config, path),
            None => Ok(()),
        })
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &Config, path: &Utf8Path) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.diagnostics_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let file = open_append(path)?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.diagnostics_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

fn open_append(path: &Utf8Path) -> Result<File, TelemetryError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TelemetryError::File {
            path: path.to_owned(),
            source,
        })
}
