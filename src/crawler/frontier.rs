//! Frontier: the pending-work queue of fetch tasks
//!
//! FIFO ordering gives a breadth-first sweep over discovered work, but no
//! invariant depends on order, only on eventual exhaustion. The frontier is
//! owned by the engine loop; completions from concurrent fetches reach it
//! through the engine's single-writer result channel, so no locking is
//! needed here.

use crate::model::Task;
use std::collections::VecDeque;

/// FIFO queue of pending fetch tasks
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<Task>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task to the back of the queue
    pub fn push(&mut self, task: Task) {
        self.queue.push_back(task);
    }

    /// Removes and returns the oldest task, if any
    pub fn pop(&mut self) -> Option<Task> {
        self.queue.pop_front()
    }

    /// Returns the number of pending tasks
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
