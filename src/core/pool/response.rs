//! core/pool/response.rs
//! The single shared output stream back to the host.
//!
//! Workers write already-encoded lines from their private buffers:
//! - `try_flush`: opportunistic, never waits for another writer
//! - `flush`: waits; used right before a worker reports its batch done
//!
//! The dispatcher attaches a fresh sink per batch and detaches it after the
//! terminator, which closes the host's end for that batch.

use std::io::{self, BufWriter, Write};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use tracing::{debug, warn};

use super::super::tags::FINISHED;

type Sink = BufWriter<Box<dyn Write + Send>>;

#[derive(Default)]
pub struct ResponseChannel {
    sink: Mutex<Option<Sink>>,
}

impl ResponseChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a batch: everything flushed from now on goes to `writer`.
    pub fn attach(&self, writer: Box<dyn Write + Send>) {
        let mut sink = self.lock();
        if sink.is_some() {
            warn!("response sink replaced before the previous batch was finished");
        }
        *sink = Some(BufWriter::new(writer));
    }

    /// Non-blocking flush. Returns false (and leaves `buffer` untouched) when
    /// another writer holds the channel.
    pub fn try_flush(&self, buffer: &mut Vec<String>) -> bool {
        let mut sink = match self.sink.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return false,
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
        };
        write_lines(&mut sink, buffer);
        true
    }

    /// Blocking flush. `buffer` is always empty afterwards.
    pub fn flush(&self, buffer: &mut Vec<String>) {
        let mut sink = self.lock();
        write_lines(&mut sink, buffer);
    }

    /// End the batch: terminator line, then close the sink.
    pub fn finish_batch(&self) -> io::Result<()> {
        let Some(mut sink) = self.lock().take() else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "no response sink attached",
            ));
        };
        writeln!(sink, "{FINISHED}")?;
        sink.flush()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Sink>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Write and clear. A failed write means the host stopped listening; the
/// rest of the buffer has nowhere to go, so it is dropped with a warning.
fn write_lines(sink: &mut Option<Sink>, buffer: &mut Vec<String>) {
    if buffer.is_empty() {
        return;
    }

    let Some(out) = sink.as_mut() else {
        warn!(lines = buffer.len(), "no response sink attached; dropping records");
        buffer.clear();
        return;
    };

    let written = buffer
        .iter()
        .try_for_each(|line| writeln!(out, "{line}"))
        .and_then(|_| out.flush());

    match written {
        Ok(()) => debug!(lines = buffer.len(), "flushed records"),
        Err(e) => warn!(error = %e, lines = buffer.len(), "response write failed; dropping records"),
    }
    buffer.clear();
}
