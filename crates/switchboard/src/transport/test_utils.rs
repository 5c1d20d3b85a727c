//! Test helpers for the transport module.

use std::collections::VecDeque;
use std::io;
use std::sync::{
    Arc, Condvar, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use super::Transport;

/// Transport that replays a fixed script of read chunks.
///
/// Once the script runs out it reports end of stream, or, when held open,
/// blocks until closed. Writes are recorded and closes counted.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    chunks: Mutex<VecDeque<io::Result<Vec<u8>>>>,
    hold_open: bool,
    closed: Mutex<bool>,
    closed_signal: Condvar,
    written: Mutex<Vec<Vec<u8>>>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub(crate) fn new<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = io::Result<Vec<u8>>>,
    {
        Self {
            chunks: Mutex::new(chunks.into_iter().collect()),
            ..Self::default()
        }
    }

    pub(crate) fn from_bytes<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self::new(chunks.into_iter().map(|chunk| Ok(chunk.as_ref().to_vec())))
    }

    /// Script that blocks after its last chunk until the transport is closed.
    pub(crate) fn held_open<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self {
            hold_open: true,
            ..Self::from_bytes(chunks)
        }
    }

    pub(crate) fn written(&self) -> Vec<Vec<u8>> {
        self.written.lock().expect("lock written").clone()
    }

    pub(crate) fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    fn wait_until_closed(&self) {
        let mut closed = self.closed.lock().expect("lock closed");
        while !*closed {
            closed = self.closed_signal.wait(closed).expect("wait closed");
        }
    }
}

impl Transport for ScriptedTransport {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let next = self.chunks.lock().expect("lock chunks").pop_front();
        match next {
            None => {
                if self.hold_open {
                    self.wait_until_closed();
                }
                Ok(0)
            }
            Some(Err(error)) => Err(error),
            Some(Ok(chunk)) => {
                let take = chunk.len().min(buf.len());
                let (head, tail) = chunk.split_at(take);
                buf.get_mut(..take).expect("fits").copy_from_slice(head);
                if !tail.is_empty() {
                    self.chunks
                        .lock()
                        .expect("lock chunks")
                        .push_front(Ok(tail.to_vec()));
                }
                Ok(take)
            }
        }
    }

    fn write_with_deadline(&self, bytes: &[u8], _deadline: Duration) -> io::Result<()> {
        self.written
            .lock()
            .expect("lock written")
            .push(bytes.to_vec());
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        *self.closed.lock().expect("lock closed") = true;
        self.closed_signal.notify_all();
        Ok(())
    }
}
