//! Shared configuration for the Tether worker.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then a
//! configuration file, then `TETHER_*` environment variables, then
//! command-line flags. The worker reads it once at startup; nothing in the
//! command loop mutates it afterwards.
//!
//! Two values shape the protocol itself: the minimum severity of log events
//! written to the host ([`Config::log_severity`]) and the command value that
//! ends the loop ([`Config::terminator`]). The remaining values configure the
//! script interpreter and the worker's internal diagnostics.

mod defaults;
mod logging;

use std::ffi::OsString;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use tether_protocol::Severity;

pub use defaults::{
    DEFAULT_DIAGNOSTICS_FILTER, DEFAULT_LOG_SEVERITY, DEFAULT_SCRIPT_MEMORY_LIMIT,
    DEFAULT_TERMINATOR, default_diagnostics_filter, default_diagnostics_format,
    default_log_severity, default_terminator,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved worker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TETHER")]
pub struct Config {
    /// Minimum severity of log events written to the host.
    #[ortho_config(default = defaults::default_log_severity())]
    pub log_severity: Severity,
    /// Command value that ends the loop normally.
    #[ortho_config(default = defaults::default_terminator())]
    pub terminator: String,
    /// Interpreter memory cap in bytes; zero means unlimited.
    #[ortho_config(default = defaults::DEFAULT_SCRIPT_MEMORY_LIMIT)]
    pub script_memory_limit: usize,
    /// `tracing` filter expression for internal diagnostics.
    #[ortho_config(default = defaults::default_diagnostics_filter())]
    pub diagnostics_filter: String,
    /// Line format for internal diagnostics.
    #[ortho_config(default = defaults::default_diagnostics_format())]
    pub diagnostics_format: LogFormat,
    /// File receiving internal diagnostics. Diagnostics are discarded when
    /// unset.
    pub diagnostics_file: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_severity: defaults::default_log_severity(),
            terminator: defaults::default_terminator(),
            script_memory_limit: DEFAULT_SCRIPT_MEMORY_LIMIT,
            diagnostics_filter: defaults::default_diagnostics_filter(),
            diagnostics_format: defaults::default_diagnostics_format(),
            diagnostics_file: None,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments, environment and
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer is malformed.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        <Self as OrthoConfig>::load()
    }

    /// Loads configuration using `args` in place of the process arguments.
    ///
    /// The first item is the program name, as with [`std::env::args_os`].
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer is malformed.
    pub fn load_from_args(
        args: impl IntoIterator<Item = OsString>,
    ) -> Result<Self, Arc<OrthoError>> {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Minimum severity of log events written to the host.
    #[must_use]
    pub const fn log_severity(&self) -> Severity {
        self.log_severity
    }

    /// Command value that ends the loop normally.
    #[must_use]
    pub fn terminator(&self) -> &str {
        self.terminator.as_str()
    }

    /// Interpreter memory cap in bytes, `None` when unlimited.
    #[must_use]
    pub const fn script_memory_limit(&self) -> Option<usize> {
        match self.script_memory_limit {
            0 => None,
            limit => Some(limit),
        }
    }

    /// `tracing` filter expression for internal diagnostics.
    #[must_use]
    pub fn diagnostics_filter(&self) -> &str {
        self.diagnostics_filter.as_str()
    }

    /// Line format for internal diagnostics.
    #[must_use]
    pub const fn diagnostics_format(&self) -> LogFormat {
        self.diagnostics_format
    }

    /// File receiving internal diagnostics, if configured.
    #[must_use]
    pub fn diagnostics_file(&self) -> Option<&Utf8Path> {
        self.diagnostics_file.as_deref()
    }
}
