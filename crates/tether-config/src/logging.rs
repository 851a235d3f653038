//! Output formats for the worker's internal diagnostics.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported formats for the diagnostics file.
///
/// Diagnostics never reach stdout or stderr because both carry protocol
/// events; the format only shapes lines written to the diagnostics file.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON, one object per line.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;
