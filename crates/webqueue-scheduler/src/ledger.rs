//! Queue ledger: the durable mirror of the work queue.
//!
//! A single JSON array of jobs that have been accepted but not yet started.
//! Every mutation rewrites the whole document, so callers must serialize
//! mutations; the scheduler does this by owning the ledger behind a mutex
//! and the mutating methods take `&mut self`.

use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};
use webqueue_core::{Error, Job, JobId, Result};

use crate::persist::{read_json, write_json};

#[derive(Debug)]
pub struct QueueLedger {
    path: PathBuf,
}

impl QueueLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the full pending sequence. A missing document is an empty ledger.
    pub async fn load(&self) -> Result<Vec<Job>> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }

    /// Create an empty ledger document if none exists yet, along with any
    /// missing parent directories.
    pub async fn init(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("{}: {}", parent.display(), e)))?;
        }

        if read_json::<Vec<Job>>(&self.path).await?.is_none() {
            write_json(&self.path, &Vec::<Job>::new()).await?;
            debug!(path = %self.path.display(), "Created empty ledger");
        }
        Ok(())
    }

    /// Add a job at the tail.
    pub async fn append(&mut self, job: &Job) -> Result<()> {
        let mut jobs = self.load().await?;
        jobs.push(job.clone());
        write_json(&self.path, &jobs).await?;
        debug!(job_id = %job.id, len = jobs.len(), "Appended to ledger");
        Ok(())
    }

    /// Remove the head entry, which should be `expected`.
    ///
    /// If the head is some other job the ledger has diverged from the queue;
    /// the entry for `expected` is removed wherever it sits so the two line
    /// up again. Returns the removed job, if any.
    pub async fn pop_front(&mut self, expected: &JobId) -> Result<Option<Job>> {
        let mut jobs = self.load().await?;

        let position = match jobs.first() {
            Some(head) if head.id == *expected => Some(0),
            Some(head) => {
                warn!(
                    expected = %expected,
                    head = %head.id,
                    "Ledger head does not match dequeued job"
                );
                jobs.iter().position(|j| j.id == *expected)
            }
            None => {
                warn!(expected = %expected, "Ledger is empty, nothing to pop");
                None
            }
        };

        let Some(position) = position else {
            return Ok(None);
        };

        let removed = jobs.remove(position);
        write_json(&self.path, &jobs).await?;
        debug!(job_id = %removed.id, len = jobs.len(), "Removed from ledger");
        Ok(Some(removed))
    }
}
