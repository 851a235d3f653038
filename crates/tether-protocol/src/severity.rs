//! Log severity levels shared by the emitter, configuration and scripts.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Severity attached to a log event.
///
/// Variants are declared in ascending order so the derived [`Ord`] gives
/// `Debug < Info < Warn < Error`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Severity {
    /// Verbose diagnostic output.
    Debug,
    /// Routine progress messages.
    #[default]
    Info,
    /// Something unexpected that did not stop the worker.
    Warn,
    /// A failure reported to the host.
    Error,
}

impl Severity {
    /// Returns `true` when a message at this severity passes `threshold`.
    #[must_use]
    pub fn passes(self, threshold: Self) -> bool {
        self >= threshold
    }
}

/// Errors encountered while parsing a [`Severity`] from text.
pub type SeverityParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[test]
    fn severities_are_ordered() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn default_is_info() {
        assert_eq!(Severity::default(), Severity::Info);
    }

    #[rstest]
    #[case::below(Severity::Debug, Severity::Info, false)]
    #[case::equal(Severity::Info, Severity::Info, true)]
    #[case::above(Severity::Error, Severity::Warn, true)]
    #[case::error_always_passes(Severity::Error, Severity::Error, true)]
    fn passes_compares_against_threshold(
        #[case] severity: Severity,
        #[case] threshold: Severity,
        #[case] expected: bool,
    ) {
        assert_eq!(severity.passes(threshold), expected);
    }

    #[rstest]
    #[case("debug", Severity::Debug)]
    #[case("INFO", Severity::Info)]
    #[case("Warn", Severity::Warn)]
    #[case("error", Severity::Error)]
    fn parses_case_insensitively(#[case] text: &str, #[case] expected: Severity) {
        assert_eq!(Severity::from_str(text).expect("parse severity"), expected);
    }

    #[test]
    fn rejects_unknown_severity() {
        assert!(Severity::from_str("fatal").is_err());
    }

    #[test]
    fn displays_lowercase() {
        assert_eq!(Severity::Warn.to_string(), "warn");
    }
}
