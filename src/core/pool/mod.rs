//! core/pool/mod.rs
//! Fixed-size worker pool.
//!
//! The dispatcher owns the pool and drives it one batch at a time:
//! - `run_batch()` wakes every worker and returns once each has reported
//!   an empty queue and an empty buffer (a full barrier)
//! - `shutdown()` sets the termination flag, wakes everyone, joins everyone

mod queue;
mod response;
mod slot;
mod worker;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

pub use queue::TaskQueue;
pub use response::ResponseChannel;

use slot::WorkerSlot;
use worker::Worker;

use super::types::FileTask;
use crate::error::{Result, ServiceError};

/// Pool size used by the service.
pub const NUM_WORKERS: usize = 2;

/// Upper bound on any pool; it is meant to stay small.
pub const MAX_WORKERS: usize = 16;

/// How often the barrier re-checks that the workers it waits on are alive.
const LIVENESS_POLL: Duration = Duration::from_millis(250);

/// What a worker does with one task: append zero or more encoded lines.
pub trait Inspect: Send + Sync {
    fn inspect(&self, task: FileTask, buffer: &mut Vec<String>);
}

pub struct WorkerPool {
    slots: Vec<WorkerSlot>,
    done_rx: Receiver<usize>,
    terminate: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Spawn `size` workers (1..=[`MAX_WORKERS`]). They idle until the first `run_batch`.
    pub fn start(
        size: usize,
        queue: Arc<TaskQueue>,
        channel: Arc<ResponseChannel>,
        inspector: Arc<dyn Inspect>,
    ) -> Result<Self> {
        // With no workers the queue would never drain and tasks would leak into the next batch.
        if !(1..=MAX_WORKERS).contains(&size) {
            return Err(ServiceError::InvalidConfig(format!(
                "pool size must be between 1 and {MAX_WORKERS}, got {size}"
            )));
        }

        let (done_tx, done_rx) = mpsc::channel::<usize>();
        let mut pool = WorkerPool {
            slots: Vec::with_capacity(size),
            done_rx,
            terminate: Arc::new(AtomicBool::new(false)),
        };

        for id in 0..size {
            let (wake_tx, wake_rx) = mpsc::channel();
            let worker = Worker {
                id,
                wake: wake_rx,
                done: done_tx.clone(),
                queue: Arc::clone(&queue),
                channel: Arc::clone(&channel),
                inspector: Arc::clone(&inspector),
                terminate: Arc::clone(&pool.terminate),
            };

            // On error `pool` drops here, which joins the workers already running.
            let handle = thread::Builder::new()
                .name(format!("tagscan-worker-{id}"))
                .spawn(move || worker.run())
                .map_err(ServiceError::WorkerSpawn)?;

            pool.slots.push(WorkerSlot::new(id, wake_tx, handle));
        }

        info!(workers = size, "worker pool started");
        Ok(pool)
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Release every worker on the current queue contents and wait until all
    /// of them have reported done.
    pub fn run_batch(&mut self) -> Result<()> {
        for slot in &mut self.slots {
            if !slot.release() {
                error!(worker = slot.id, "worker is gone; cannot release batch");
                return Err(ServiceError::WorkerLost(slot.id));
            }
        }

        self.await_completion()
    }

    fn await_completion(&mut self) -> Result<()> {
        while let Some(waiting) = self.slots.iter().find(|s| s.is_pending()).map(|s| s.id) {
            match self.done_rx.recv_timeout(LIVENESS_POLL) {
                Ok(id) => match self.slots.get_mut(id) {
                    Some(slot) => slot.complete(),
                    None => warn!(worker = id, "done report from unknown worker"),
                },
                Err(RecvTimeoutError::Timeout) => {
                    // A pending worker that has exited will never report.
                    if let Some(dead) = self
                        .slots
                        .iter()
                        .find(|s| s.is_pending() && !s.is_alive())
                    {
                        error!(worker = dead.id, "worker exited mid-batch");
                        return Err(ServiceError::WorkerLost(dead.id));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    error!(worker = waiting, "all workers gone while waiting for batch");
                    return Err(ServiceError::WorkerLost(waiting));
                }
            }
        }

        Ok(())
    }

    /// Terminate and join every worker. Idempotent.
    pub fn shutdown(&mut self) {
        if self.slots.is_empty() {
            return;
        }

        self.terminate.store(true, Ordering::Release);
        for slot in &self.slots {
            slot.wake_for_shutdown();
        }
        for slot in &mut self.slots {
            if !slot.join() {
                warn!(worker = slot.id, "worker panicked");
            }
        }

        debug!(workers = self.slots.len(), "worker pool joined");
        self.slots.clear();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
