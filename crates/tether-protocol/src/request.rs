//! Command requests sent from the host to the worker on stdin.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named arguments passed to an operation.
pub type Arguments = Map<String, Value>;

/// One command line from the host.
///
/// `cmd` names the operation to run, or carries the terminator sentinel.
/// `def` optionally supplies (or replaces) the operation's logic. `args` is
/// the argument mapping; it may be omitted or `null`, both of which mean an
/// empty mapping.
///
/// # Example
///
/// ```
/// use tether_protocol::CommandRequest;
///
/// let request = CommandRequest::new("f").with_definition("return 'hello'");
/// let line = serde_json::to_string(&request).expect("serialise");
/// assert_eq!(line, r#"{"cmd":"f","def":"return 'hello'"}"#);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandRequest {
    cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    def: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    args: Option<Arguments>,
}

impl CommandRequest {
    /// Creates a request naming `operation` with no logic and no arguments.
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            cmd: operation.into(),
            def: None,
            args: None,
        }
    }

    /// Attaches logic text that defines or replaces the operation.
    #[must_use]
    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.def = Some(definition.into());
        self
    }

    /// Attaches the argument mapping.
    #[must_use]
    pub fn with_arguments(mut self, arguments: Arguments) -> Self {
        self.args = Some(arguments);
        self
    }

    /// Parses one JSON line into a request.
    ///
    /// Trailing whitespace, including the line terminator, is ignored.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] when the line is not
    /// valid JSON or does not match the request schema.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim_end())
    }

    /// Returns the operation name (or terminator sentinel).
    #[must_use]
    pub const fn operation(&self) -> &str {
        self.cmd.as_str()
    }

    /// Returns the supplied logic text, if any.
    #[must_use]
    pub fn definition(&self) -> Option<&str> {
        self.def.as_deref()
    }

    /// Returns the supplied arguments, if any.
    #[must_use]
    pub const fn arguments(&self) -> Option<&Arguments> {
        self.args.as_ref()
    }

    /// Splits the request into operation name, logic text and arguments.
    ///
    /// Absent arguments become an empty mapping.
    #[must_use]
    pub fn into_parts(self) -> (String, Option<String>, Arguments) {
        (self.cmd, self.def, self.args.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_operation_only() {
        let request = CommandRequest::parse(r#"{"cmd":"done"}"#).expect("parse");
        assert_eq!(request.operation(), "done");
        assert!(request.definition().is_none());
        assert!(request.arguments().is_none());
    }

    #[test]
    fn parses_definition_and_arguments() {
        let request =
            CommandRequest::parse(r#"{"cmd":"f","def":"return 1","args":{"1":"hello"}}"#)
                .expect("parse");
        assert_eq!(request.definition(), Some("return 1"));
        let args = request.arguments().expect("arguments present");
        assert_eq!(args.get("1"), Some(&json!("hello")));
    }

    #[test]
    fn null_arguments_become_empty_mapping() {
        let request = CommandRequest::parse(r#"{"cmd":"f","args":null}"#).expect("parse");
        let (_, _, args) = request.into_parts();
        assert!(args.is_empty());
    }

    #[test]
    fn ignores_trailing_line_terminator() {
        let request = CommandRequest::parse("{\"cmd\":\"f\"}\r\n").expect("parse");
        assert_eq!(request.operation(), "f");
    }

    #[rstest]
    #[case::truncated(r#"{"cmd":"}"#)]
    #[case::missing_cmd(r#"{"def":"return 1"}"#)]
    #[case::numeric_cmd(r#"{"cmd":42}"#)]
    #[case::array_args(r#"{"cmd":"f","args":[1,2]}"#)]
    #[case::not_an_object("[]")]
    #[case::empty("")]
    fn rejects_malformed_lines(#[case] line: &str) {
        assert!(CommandRequest::parse(line).is_err(), "accepted: {line}");
    }

    #[test]
    fn serialises_without_absent_fields() {
        let mut args = Arguments::new();
        args.insert(String::from("1"), json!("bye"));
        let request = CommandRequest::new("f").with_arguments(args);
        let line = serde_json::to_string(&request).expect("serialise");
        assert_eq!(line, r#"{"cmd":"f","args":{"1":"bye"}}"#);
    }
}
