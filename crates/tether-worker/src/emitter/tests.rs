//! Unit tests for event emission.

use std::io;

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;

const TIME: &str = "2024-01-01T00:00:00Z";

#[derive(Debug, Clone, Copy)]
struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> String {
        TIME.to_owned()
    }
}

type TestEmitter = Emitter<Vec<u8>, Vec<u8>, FixedClock>;

#[fixture]
fn emitter() -> TestEmitter {
    Emitter::with_clock(Vec::new(), Vec::new(), Severity::Info, FixedClock)
}

fn streams(emitter: TestEmitter) -> (String, String) {
    let (primary, errors) = emitter.into_inner();
    (
        String::from_utf8(primary).expect("utf8 stdout"),
        String::from_utf8(errors).expect("utf8 stderr"),
    )
}

#[rstest]
fn log_writes_one_line(mut emitter: TestEmitter) {
    emitter.log(LogRecord::new("Starting")).expect("emit");
    let (primary, errors) = streams(emitter);
    assert_eq!(
        primary,
        "{\"log\":{\"severity\":\"info\",\"message\":\"Starting\",\"time\":\"2024-01-01T00:00:00Z\",\"stackTrace\":\"\"}}\n"
    );
    assert!(errors.is_empty());
}

#[rstest]
#[case::debug_below_info(Severity::Debug, Severity::Info, false)]
#[case::info_at_info(Severity::Info, Severity::Info, true)]
#[case::warn_above_info(Severity::Warn, Severity::Info, true)]
#[case::info_below_warn(Severity::Info, Severity::Warn, false)]
#[case::error_at_error(Severity::Error, Severity::Error, true)]
#[case::debug_at_debug(Severity::Debug, Severity::Debug, true)]
fn log_respects_threshold(
    #[case] severity: Severity,
    #[case] threshold: Severity,
    #[case] written: bool,
) {
    let mut emitter = Emitter::with_clock(Vec::new(), Vec::new(), threshold, FixedClock);
    assert_eq!(emitter.threshold(), threshold);
    emitter
        .log(LogRecord::new("m").with_severity(severity))
        .expect("emit");
    let (primary, errors) = streams(emitter);
    assert_eq!(!primary.is_empty(), written);
    assert!(errors.is_empty());
}

#[rstest]
fn explicit_timestamp_and_trace_are_kept(mut emitter: TestEmitter) {
    emitter
        .log(
            LogRecord::new("m")
                .with_severity(Severity::Warn)
                .with_timestamp("then")
                .with_stack_trace("trace"),
        )
        .expect("emit");
    let (primary, _) = streams(emitter);
    assert_eq!(
        primary,
        "{\"log\":{\"severity\":\"warn\",\"message\":\"m\",\"time\":\"then\",\"stackTrace\":\"trace\"}}\n"
    );
}

#[rstest]
#[case::error_threshold(Severity::Error)]
#[case::info_threshold(Severity::Info)]
fn results_ignore_threshold(#[case] threshold: Severity) {
    let mut emitter = Emitter::with_clock(Vec::new(), Vec::new(), threshold, FixedClock);
    emitter.result(json!("hello")).expect("emit");
    let (primary, _) = streams(emitter);
    assert_eq!(primary, "{\"result\":{\"data\":\"hello\"}}\n");
}

#[rstest]
fn entities_are_written_verbatim(mut emitter: TestEmitter) {
    let Value::Object(entity) = json!({"id": 7, "kind": "row"}) else {
        panic!("literal is an object");
    };
    emitter.entity(entity).expect("emit");
    let (primary, _) = streams(emitter);
    assert_eq!(primary, "{\"entity\":{\"id\":7,\"kind\":\"row\"}}\n");
}

#[rstest]
fn errors_reach_both_streams_once(mut emitter: TestEmitter) {
    let disposition = emitter
        .error(ErrorReport::new("Could not parse JSON: {").with_location("f:1"))
        .expect("emit");
    let (primary, errors) = streams(emitter);

    assert_eq!(disposition, Disposition::Continue);
    assert_eq!(
        errors,
        "{\"error\":{\"message\":\"Could not parse JSON: {\",\"time\":\"2024-01-01T00:00:00Z\",\"location\":\"f:1\",\"stackTrace\":\"\"}}\n"
    );
    assert_eq!(
        primary,
        "{\"log\":{\"severity\":\"error\",\"message\":\"Could not parse JSON: {\",\"time\":\"2024-01-01T00:00:00Z\",\"stackTrace\":\"\"}}\n"
    );
}

#[rstest]
fn terminating_errors_ask_to_stop(mut emitter: TestEmitter) {
    let report = ErrorReport::new("fatal").terminating();
    assert!(report.is_terminating());
    assert!(!ErrorReport::new("recoverable").is_terminating());
    let disposition = emitter.error(report).expect("emit");
    assert_eq!(disposition, Disposition::Terminate);
}

#[rstest]
fn error_log_shares_timestamp_and_trace(mut emitter: TestEmitter) {
    emitter
        .error(
            ErrorReport::new("boom")
                .with_timestamp("then")
                .with_stack_trace("stack traceback:"),
        )
        .expect("emit");
    let (primary, errors) = streams(emitter);
    assert!(errors.contains("\"time\":\"then\""));
    assert!(errors.contains("\"stackTrace\":\"stack traceback:\""));
    assert!(primary.contains("\"time\":\"then\""));
    assert!(primary.contains("\"stackTrace\":\"stack traceback:\""));
}

#[test]
fn system_clock_produces_rfc3339() {
    let stamp = SystemClock.now();
    assert!(stamp.ends_with('Z'), "stamp: {stamp}");
    assert_eq!(stamp.find('T'), Some(10), "stamp: {stamp}");
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn write_failures_name_the_stream() {
    let mut emitter = Emitter::with_clock(Vec::new(), BrokenPipe, Severity::Info, FixedClock);
    let error = emitter
        .error(ErrorReport::new("x"))
        .expect_err("stderr is closed");
    assert!(matches!(
        error,
        EmitError::Write {
            stream: EventStream::Error,
            ..
        }
    ));
}
