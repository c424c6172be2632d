//! Executor trait and the default delay executor.
//!
//! The worker hands each job to an executor and records whatever comes back:
//! a final payload marks the job done, an error marks it failed.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::{Job, Payload, Result};

/// Trait for job executors.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Name of this executor.
    fn name(&self) -> &'static str;

    /// Perform the job's work and return its final payload.
    ///
    /// There is no timeout: the worker waits for this future to finish
    /// before taking the next job.
    async fn execute(&self, job: &Job) -> Result<Payload>;
}

/// Sleeps for a fixed duration and returns the payload unchanged.
#[derive(Debug, Clone)]
pub struct DelayExecutor {
    delay: Duration,
}

impl DelayExecutor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for DelayExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl Executor for DelayExecutor {
    fn name(&self) -> &'static str {
        "delay"
    }

    async fn execute(&self, job: &Job) -> Result<Payload> {
        debug!(job_id = %job.id, delay_ms = self.delay.as_millis() as u64, "Sleeping");
        tokio::time::sleep(self.delay).await;
        Ok(job.payload.clone())
    }
}
