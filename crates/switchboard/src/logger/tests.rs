//! Unit tests for the logger capability.

use std::sync::Mutex;

use super::*;

#[derive(Default)]
struct Recording {
    lines: Mutex<Vec<String>>,
}

impl ConnLogger for Recording {
    fn debug(&self, args: fmt::Arguments<'_>) {
        self.lines
            .lock()
            .expect("lock lines")
            .push(format!("debug {args}"));
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        self.lines
            .lock()
            .expect("lock lines")
            .push(format!("warn {args}"));
    }
}

#[test]
fn arc_forwards_to_inner_logger() {
    let inner = Arc::new(Recording::default());
    let shared: SharedLogger = Arc::clone(&inner) as SharedLogger;
    shared.debug(format_args!("auth.{}", "login"));
    shared.warn(format_args!("unknown group"));

    let lines = inner.lines.lock().expect("lock lines").clone();
    assert_eq!(lines, vec!["debug auth.login", "warn unknown group"]);
}

#[test]
fn discard_logger_accepts_events() {
    let logger = DiscardLogger;
    logger.debug(format_args!("ignored"));
    logger.warn(format_args!("ignored"));
}

#[test]
fn tracing_logger_keeps_label() {
    let logger = TracingLogger::new("server");
    assert_eq!(logger.label(), "server");
    logger.debug(format_args!("no subscriber installed"));
}
