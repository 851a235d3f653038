//! Wire types for the Tether worker protocol.
//!
//! The protocol is a line-delimited JSON exchange over standard I/O. The host
//! writes one [`CommandRequest`] per line to the worker's stdin. The worker
//! answers with [`Event`] lines: logs, results and entities on stdout, errors
//! on stderr. Every event is a single-key object whose key names the event
//! kind, for example `{"result":{"data":"hello"}}`.
//!
//! # Example
//!
//! ```
//! use tether_protocol::{CommandRequest, Event};
//!
//! let request = CommandRequest::parse(r#"{"cmd":"greet","args":{"name":"Ada"}}"#)
//!     .expect("request parses");
//! assert_eq!(request.operation(), "greet");
//!
//! let line = Event::result(serde_json::json!("hello")).to_line().expect("serialises");
//! assert_eq!(line, r#"{"result":{"data":"hello"}}"#);
//! ```

pub mod event;
pub mod request;
pub mod severity;

pub use self::event::{ErrorEvent, Event, EventStream, LogEvent, ResultEvent};
pub use self::request::{Arguments, CommandRequest};
pub use self::severity::{Severity, SeverityParseError};
