//! Input line decoding.
//!
//! Turns one raw line from the host into a [`Command`]. Anything that is not
//! a JSON object with a string `cmd` is a [`DecodeFailure`] carrying the raw
//! line, which the loop reports and then moves past.

use tether_protocol::{Arguments, CommandRequest};
use thiserror::Error;

/// A decoded request from the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    operation: String,
    definition: Option<String>,
    arguments: Arguments,
    terminator: bool,
}

impl Command {
    /// Returns the operation name.
    #[must_use]
    pub const fn operation(&self) -> &str {
        self.operation.as_str()
    }

    /// Returns the logic text to install, if the host sent one.
    #[must_use]
    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    /// Returns the argument object, empty when none was sent.
    #[must_use]
    pub const fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Returns whether this command ends the session.
    #[must_use]
    pub const fn is_terminator(&self) -> bool {
        self.terminator
    }
}

/// A line that could not be decoded.
#[derive(Debug, Error)]
#[error("Could not parse JSON: {line}")]
pub struct DecodeFailure {
    line: String,
    #[source]
    source: serde_json::Error,
}

impl DecodeFailure {
    /// Returns the offending line without its line terminator.
    #[must_use]
    pub const fn line(&self) -> &str {
        self.line.as_str()
    }
}

/// Decodes host lines, recognising the configured terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDecoder {
    terminator: String,
}

impl CommandDecoder {
    /// Creates a decoder that treats `cmd == terminator` as end of session.
    #[must_use]
    pub fn new(terminator: impl Into<String>) -> Self {
        Self {
            terminator: terminator.into(),
        }
    }

    /// Returns the terminator sentinel.
    #[must_use]
    pub const fn terminator(&self) -> &str {
        self.terminator.as_str()
    }

    /// Decodes one line.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeFailure`] when the line is not valid JSON or does not
    /// have the command shape.
    pub fn decode(&self, line: &str) -> Result<Command, DecodeFailure> {
        let raw = line.trim_end_matches(['\r', '\n']);
        let request = CommandRequest::parse(raw).map_err(|source| DecodeFailure {
            line: raw.to_owned(),
            source,
        })?;
        let (operation, definition, arguments) = request.into_parts();
        let terminator = operation == self.terminator;
        Ok(Command {
            operation,
            definition,
            arguments,
            terminator,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    #[fixture]
    fn decoder() -> CommandDecoder {
        CommandDecoder::new("done")
    }

    #[rstest]
    fn decodes_definition_and_arguments(decoder: CommandDecoder) {
        let command = decoder
            .decode("{\"cmd\":\"f\",\"def\":\"return 1\",\"args\":{\"1\":\"a\"}}\n")
            .expect("decodes");
        assert_eq!(command.operation(), "f");
        assert_eq!(command.definition(), Some("return 1"));
        assert_eq!(command.arguments().get("1"), Some(&json!("a")));
        assert!(!command.is_terminator());
    }

    #[rstest]
    fn absent_arguments_are_empty(decoder: CommandDecoder) {
        let command = decoder.decode("{\"cmd\":\"f\"}").expect("decodes");
        assert!(command.arguments().is_empty());
        assert!(command.definition().is_none());
    }

    #[rstest]
    #[case::default_sentinel("done", "{\"cmd\":\"done\"}", true)]
    #[case::custom_sentinel("quit", "{\"cmd\":\"quit\"}", true)]
    #[case::old_sentinel_is_ordinary("quit", "{\"cmd\":\"done\"}", false)]
    #[case::case_sensitive("done", "{\"cmd\":\"DONE\"}", false)]
    fn recognises_terminator(#[case] sentinel: &str, #[case] line: &str, #[case] expected: bool) {
        let command = CommandDecoder::new(sentinel).decode(line).expect("decodes");
        assert_eq!(command.is_terminator(), expected);
    }

    #[rstest]
    #[case::unterminated_string("{\"cmd\":\"}\n", "{\"cmd\":\"}")]
    #[case::missing_cmd("{\"def\":\"x\"}\r\n", "{\"def\":\"x\"}")]
    #[case::non_string_cmd("{\"cmd\":3}", "{\"cmd\":3}")]
    #[case::not_an_object("[1,2]", "[1,2]")]
    #[case::empty("\n", "")]
    fn failures_keep_the_raw_line(
        decoder: CommandDecoder,
        #[case] line: &str,
        #[case] raw: &str,
    ) {
        let failure = decoder.decode(line).expect_err("rejects");
        assert_eq!(failure.line(), raw);
        assert_eq!(failure.to_string(), format!("Could not parse JSON: {raw}"));
    }
}
