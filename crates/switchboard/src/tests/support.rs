//! Shared doubles for connection tests.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::logger::ConnLogger;

/// How long tests wait for work done on other threads.
pub(crate) const WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogLevel {
    Debug,
    Warn,
}

/// Polls `check` until it holds or [`WAIT`] elapses.
pub(crate) fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    check()
}

/// Logger that records every event for later inspection.
#[derive(Default)]
pub(crate) struct RecordingLogger {
    events: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLogger {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn events(&self) -> Vec<(LogLevel, String)> {
        self.events.lock().expect("lock events").clone()
    }

    pub(crate) fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|(logged, message)| *logged == level && message.contains(needle))
    }

    /// Polls until an event matching `level` and `needle` is recorded.
    pub(crate) fn wait_for(&self, level: LogLevel, needle: &str) -> bool {
        eventually(|| self.contains(level, needle))
    }

    fn record(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        self.events
            .lock()
            .expect("lock events")
            .push((level, args.to_string()));
    }
}

impl ConnLogger for RecordingLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        self.record(LogLevel::Debug, args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        self.record(LogLevel::Warn, args);
    }
}

/// Handler that forwards every body it receives into a channel.
pub(crate) fn forwarding_handler() -> (
    impl Fn(&dyn ConnLogger, &[u8]) -> anyhow::Result<()> + Send + Sync + 'static,
    Receiver<Vec<u8>>,
) {
    let (tx, rx): (Sender<Vec<u8>>, Receiver<Vec<u8>>) = mpsc::channel();
    let handler = move |_log: &dyn ConnLogger, body: &[u8]| -> anyhow::Result<()> {
        tx.send(body.to_vec())?;
        Ok(())
    };
    (handler, rx)
}
