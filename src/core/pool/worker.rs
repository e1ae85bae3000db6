//! core/pool/worker.rs
//! One long-lived worker thread.
//!
//! Loop:
//! - Idle: block on our own wake channel
//! - Draining: pop tasks until the queue is empty, inspecting each one and
//!   pushing records out whenever the response channel happens to be free
//! - Done: blocking flush of whatever is still buffered, then report

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};

use tracing::{debug, trace};

use super::queue::TaskQueue;
use super::response::ResponseChannel;
use super::slot::WorkerSignal;
use super::Inspect;

pub(crate) struct Worker {
    pub(crate) id: usize,
    pub(crate) wake: Receiver<WorkerSignal>,
    pub(crate) done: Sender<usize>,
    pub(crate) queue: Arc<TaskQueue>,
    pub(crate) channel: Arc<ResponseChannel>,
    pub(crate) inspector: Arc<dyn Inspect>,
    pub(crate) terminate: Arc<AtomicBool>,
}

impl Worker {
    pub(crate) fn run(self) {
        debug!(worker = self.id, "worker started");

        // Private: only this thread ever touches it.
        let mut buffer: Vec<String> = Vec::new();

        loop {
            match self.wake.recv() {
                Ok(WorkerSignal::StartBatch) => {}
                // Shutdown signal, or the pool itself is gone.
                Ok(WorkerSignal::Shutdown) | Err(_) => break,
            }

            if self.terminate.load(Ordering::Acquire) {
                break;
            }

            self.drain(&mut buffer);

            if self.done.send(self.id).is_err() {
                break;
            }
        }

        debug!(worker = self.id, "worker stopped");
    }

    fn drain(&self, buffer: &mut Vec<String>) {
        let mut inspected = 0usize;

        while let Some(task) = self.queue.try_dequeue() {
            self.inspector.inspect(task, buffer);
            inspected += 1;

            if !buffer.is_empty() && !self.channel.try_flush(buffer) {
                trace!(worker = self.id, buffered = buffer.len(), "channel busy; buffering");
            }
        }

        // Queue is empty: nothing may stay buffered past this point.
        self.channel.flush(buffer);
        debug!(worker = self.id, inspected, "batch drained");
    }
}
