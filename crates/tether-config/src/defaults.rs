use tether_protocol::Severity;

use crate::logging::LogFormat;

/// Default minimum severity for protocol log events.
pub const DEFAULT_LOG_SEVERITY: Severity = Severity::Info;

/// Default command value that ends the loop normally.
pub const DEFAULT_TERMINATOR: &str = "done";

/// Default diagnostics filter expression.
pub const DEFAULT_DIAGNOSTICS_FILTER: &str = "info";

/// Default interpreter memory limit; zero disables the limit.
pub const DEFAULT_SCRIPT_MEMORY_LIMIT: usize = 0;

/// Default minimum severity for protocol log events.
pub fn default_log_severity() -> Severity {
    DEFAULT_LOG_SEVERITY
}

/// Owned terminator value used where allocation is required (e.g. serde).
pub fn default_terminator() -> String {
    DEFAULT_TERMINATOR.to_owned()
}

/// Owned diagnostics filter used where allocation is required (e.g. serde).
pub fn default_diagnostics_filter() -> String {
    DEFAULT_DIAGNOSTICS_FILTER.to_owned()
}

/// Default diagnostics format.
pub fn default_diagnostics_format() -> LogFormat {
    LogFormat::Json
}
