//! Splits the transport byte stream into envelope frames.
//!
//! In [`Framing::Lines`] mode every envelope ends with `\n`. Reads are
//! accumulated until a newline arrives, so an envelope may span any number
//! of reads, and one read may carry several envelopes. A line longer than
//! the configured limit is dropped and the reader resynchronises at the next
//! newline.
//!
//! In [`Framing::Unframed`] mode each read into a fresh zeroed buffer is one
//! frame, with trailing NUL bytes trimmed.

use std::borrow::Cow;
use std::io;

use switchboard_config::{ConnConfig, Framing};
use tracing::warn;

use crate::protocol::trim_trailing_nul;
use crate::transport::{Transport, read_with_retry};

const FRAMING_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::framing");

/// Incremental frame reader bound to one connection.
#[derive(Debug)]
pub(crate) struct FrameReader {
    framing: Framing,
    read_unit: usize,
    max_frame: usize,
    pending: Vec<u8>,
    discarding: bool,
    ended: bool,
}

impl FrameReader {
    pub(crate) fn new(config: &ConnConfig) -> Self {
        Self {
            framing: config.framing,
            read_unit: config.read_unit_bytes.max(1),
            max_frame: config.max_frame_bytes.max(1),
            pending: Vec::new(),
            discarding: false,
            ended: false,
        }
    }

    /// Returns the next frame, or `None` once the stream has ended.
    ///
    /// # Errors
    ///
    /// Returns the transport error that interrupted the read.
    pub(crate) fn next_frame(&mut self, transport: &dyn Transport) -> io::Result<Option<Vec<u8>>> {
        match self.framing {
            Framing::Lines => self.next_line(transport),
            Framing::Unframed => self.next_unit(transport),
        }
    }

    fn next_line(&mut self, transport: &dyn Transport) -> io::Result<Option<Vec<u8>>> {
        loop {
            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }
            if self.ended {
                return Ok(None);
            }

            let mut chunk = vec![0_u8; self.read_unit];
            let read = read_with_retry(transport, &mut chunk)?;
            if read == 0 {
                self.ended = true;
                if let Some(tail) = self.take_tail() {
                    return Ok(Some(tail));
                }
                return Ok(None);
            }

            chunk.truncate(read);
            self.pending.extend_from_slice(&chunk);
            self.enforce_limit();
        }
    }

    fn next_unit(&mut self, transport: &dyn Transport) -> io::Result<Option<Vec<u8>>> {
        loop {
            let mut buffer = vec![0_u8; self.read_unit];
            let read = read_with_retry(transport, &mut buffer)?;
            if read == 0 {
                return Ok(None);
            }

            let frame = trim_trailing_nul(&buffer);
            if !frame.is_empty() {
                return Ok(Some(frame.to_vec()));
            }
        }
    }

    /// Pops complete, non-blank lines from the pending buffer.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        while let Some(newline) = self.pending.iter().position(|byte| *byte == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=newline).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            line.truncate(trimmed_len(&line));
            if line.len() > self.max_frame {
                warn_oversized(line.len(), self.max_frame);
                continue;
            }
            if !line.is_empty() {
                return Some(line);
            }
        }
        None
    }

    /// Yields a final unterminated line when the stream ends.
    fn take_tail(&mut self) -> Option<Vec<u8>> {
        let mut tail = std::mem::take(&mut self.pending);
        if self.discarding {
            return None;
        }
        tail.truncate(trimmed_len(&tail));
        (!tail.is_empty()).then_some(tail)
    }

    fn enforce_limit(&mut self) {
        let unterminated = !self.pending.contains(&b'\n');
        if unterminated && self.pending.len() > self.max_frame {
            if !self.discarding {
                warn_oversized(self.pending.len(), self.max_frame);
            }
            self.pending.clear();
            self.discarding = true;
        }
    }
}

/// Appends the frame delimiter for `framing` to `payload`.
pub(crate) fn encode_frame(framing: Framing, payload: &[u8]) -> Cow<'_, [u8]> {
    match framing {
        Framing::Lines => {
            let mut framed = Vec::with_capacity(payload.len() + 1);
            framed.extend_from_slice(payload);
            framed.push(b'\n');
            Cow::Owned(framed)
        }
        Framing::Unframed => Cow::Borrowed(payload),
    }
}

fn trimmed_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1)
}

fn warn_oversized(size: usize, max_size: usize) {
    warn!(
        target: FRAMING_TARGET,
        size,
        max_size,
        "dropping oversized frame"
    );
}
