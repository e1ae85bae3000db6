//! core/pool/queue.rs
//! Shared FIFO of pending file handles.
//!
//! Emptiness is the normal "batch drained" signal, not an error.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::super::types::FileTask;

#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Mutex<VecDeque<FileTask>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, task: FileTask) {
        self.lock().push_back(task);
    }

    /// Enqueue a whole batch under one lock, in submission order.
    pub fn extend(&self, tasks: impl IntoIterator<Item = FileTask>) {
        self.lock().extend(tasks);
    }

    pub fn try_dequeue(&self) -> Option<FileTask> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panicking holder can't leave a VecDeque half-updated, so the data is still good.
    fn lock(&self) -> MutexGuard<'_, VecDeque<FileTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
