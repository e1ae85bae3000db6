//! core/pool/slot.rs
//! Dispatcher-side state for one worker.
//!
//! Every worker gets its own wake channel, so releasing a batch only rouses
//! the workers we address. `pending` is set here when the batch is released
//! and cleared here when that worker's "done" arrives; nobody else touches it.

use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerSignal {
    /// Queue has been filled; drain it and report done.
    StartBatch,
    /// Leave the loop. Sent after the termination flag is set.
    Shutdown,
}

pub(crate) struct WorkerSlot {
    pub(crate) id: usize,
    wake: Sender<WorkerSignal>,
    pending: bool,
    handle: Option<JoinHandle<()>>,
}

impl WorkerSlot {
    pub(crate) fn new(id: usize, wake: Sender<WorkerSignal>, handle: JoinHandle<()>) -> Self {
        Self {
            id,
            wake,
            pending: false,
            handle: Some(handle),
        }
    }

    /// Mark pending and wake the worker. False if the worker is gone.
    pub(crate) fn release(&mut self) -> bool {
        self.pending = true;
        self.wake.send(WorkerSignal::StartBatch).is_ok()
    }

    pub(crate) fn complete(&mut self) {
        self.pending = false;
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending
    }

    /// A thread that has finished while we still wait on it will never report.
    pub(crate) fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Best-effort: an idle worker re-checks the termination flag and exits.
    pub(crate) fn wake_for_shutdown(&self) {
        let _ = self.wake.send(WorkerSignal::Shutdown);
    }

    /// Join the worker thread. Returns false if it panicked.
    pub(crate) fn join(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => handle.join().is_ok(),
            None => true,
        }
    }
}
