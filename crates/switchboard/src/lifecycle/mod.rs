//! Connection lifecycle and shutdown notification.
//!
//! A connection is [`Lifecycle::Active`] until it is destroyed, either
//! explicitly or because its transport failed. Destruction is one-way and
//! fires every [`DoneSignal`] handed out so far exactly once. A signal
//! requested after destruction is born fired.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::time::Duration;

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lifecycle {
    /// The dispatcher is running and writes are permitted.
    #[default]
    Active,
    /// The transport is closed and all done signals have fired.
    Destroyed,
}

/// One-shot notification that a connection has been destroyed.
///
/// A dropped sender counts as a notification too, so a waiter never blocks
/// past the connection's destruction.
#[derive(Debug)]
pub struct DoneSignal {
    receiver: Receiver<()>,
}

impl DoneSignal {
    /// Blocks until the connection is destroyed.
    pub fn wait(self) {
        // A disconnected sender also means the connection is gone.
        self.receiver.recv().unwrap_or_default();
    }

    /// Blocks for at most `timeout`; returns `true` if the connection was
    /// destroyed in time.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }

    /// Returns `true` if the connection has been destroyed, without blocking.
    #[must_use]
    pub fn try_wait(&self) -> bool {
        match self.receiver.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => true,
            Err(TryRecvError::Empty) => false,
        }
    }
}

/// Registered done channels awaiting destruction.
#[derive(Debug, Default)]
pub(crate) struct DoneSignals {
    senders: Vec<SyncSender<()>>,
}

impl DoneSignals {
    /// Hands out a new signal; it is fired immediately if `state` is already
    /// [`Lifecycle::Destroyed`].
    pub(crate) fn register(&mut self, state: Lifecycle) -> DoneSignal {
        let (sender, receiver) = mpsc::sync_channel(1);
        match state {
            Lifecycle::Active => self.senders.push(sender),
            Lifecycle::Destroyed => {
                // Capacity one and no prior send: this cannot fail.
                sender.try_send(()).unwrap_or_default();
            }
        }
        DoneSignal { receiver }
    }

    /// Fires every registered signal once without blocking and forgets them.
    ///
    /// Returns how many waiters were still listening.
    pub(crate) fn fire_all(&mut self) -> usize {
        self.senders
            .drain(..)
            .filter(|sender| sender.try_send(()).is_ok())
            .count()
    }

    /// Returns how many waiters are still registered.
    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn active_signal_is_pending_until_fired() {
        let mut signals = DoneSignals::default();
        let signal = signals.register(Lifecycle::Active);
        assert!(!signal.try_wait());
        assert_eq!(signals.fire_all(), 1);
        assert!(signal.try_wait());
        assert_eq!(signals.len(), 0);
    }

    #[test]
    fn every_waiter_is_notified() {
        let mut signals = DoneSignals::default();
        let first = signals.register(Lifecycle::Active);
        let second = signals.register(Lifecycle::Active);
        let waiter = thread::spawn(move || first.wait());
        assert_eq!(signals.fire_all(), 2);
        waiter.join().expect("join waiter");
        assert!(second.wait_timeout(Duration::from_secs(1)));
    }

    #[test]
    fn signal_registered_after_destruction_is_fired() {
        let mut signals = DoneSignals::default();
        let signal = signals.register(Lifecycle::Destroyed);
        assert!(signal.try_wait());
        assert_eq!(signals.len(), 0);
    }

    #[test]
    fn departed_waiters_are_skipped() {
        let mut signals = DoneSignals::default();
        drop(signals.register(Lifecycle::Active));
        let kept = signals.register(Lifecycle::Active);
        assert_eq!(signals.fire_all(), 1);
        assert!(kept.try_wait());
    }

    #[test]
    fn pending_signal_times_out() {
        let mut signals = DoneSignals::default();
        let signal = signals.register(Lifecycle::Active);
        assert!(!signal.wait_timeout(Duration::from_millis(10)));
    }
}
