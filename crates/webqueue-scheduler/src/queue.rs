//! In-memory FIFO of jobs waiting for the worker.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use webqueue_core::Job;

/// Hand-off point between submitters and the worker.
#[derive(Debug, Default)]
pub struct WorkQueue {
    jobs: Mutex<VecDeque<Job>>,
    notify: Notify,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn jobs(&self) -> MutexGuard<'_, VecDeque<Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a job at the tail and wake the worker.
    pub fn push(&self, job: Job) {
        self.jobs().push_back(job);
        self.notify.notify_one();
    }

    /// Remove the head job without waiting.
    pub fn try_pop(&self) -> Option<Job> {
        self.jobs().pop_front()
    }

    /// Wait until a job is available and remove it.
    ///
    /// Cancel safe: a job is only taken from the queue when this returns.
    /// Intended for a single consumer.
    pub async fn pop(&self) -> Job {
        loop {
            if let Some(job) = self.try_pop() {
                return job;
            }
            self.notify.notified().await;
        }
    }

    /// Copy of the pending jobs, head first.
    pub fn snapshot(&self) -> Vec<Job> {
        self.jobs().iter().cloned().collect()
    }
}
