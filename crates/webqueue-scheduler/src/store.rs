//! Per-job result records on disk.
//!
//! Each job gets its own directory under the results root, holding a single
//! `result.json` with the job's current record.

use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;
use webqueue_core::{Error, Job, JobId, Result};

use crate::persist::{read_json, write_json};

const RESULT_FILE: &str = "result.json";

/// File-per-job store of job records, keyed by job id.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn job_dir(&self, id: &JobId) -> PathBuf {
        self.root.join(id.to_string())
    }

    fn record_path(&self, id: &JobId) -> PathBuf {
        self.job_dir(id).join(RESULT_FILE)
    }

    /// Create the job's directory and write its initial record.
    ///
    /// Fails if a directory for this id already exists.
    pub async fn create(&self, job: &Job) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Error::Storage(format!("{}: {}", self.root.display(), e)))?;

        let dir = self.job_dir(&job.id);
        fs::create_dir(&dir).await.map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                Error::Internal(format!("result record for {} already exists", job.id))
            } else {
                Error::Storage(format!("{}: {}", dir.display(), e))
            }
        })?;

        write_json(&self.record_path(&job.id), job).await?;
        debug!(job_id = %job.id, dir = %dir.display(), "Result record created");
        Ok(())
    }

    /// Read the record for `id`, or `None` if no job with that id was accepted.
    pub async fn get(&self, id: &JobId) -> Result<Option<Job>> {
        read_json(&self.record_path(id)).await
    }

    /// Delete the job's directory and everything in it.
    pub async fn discard(&self, id: &JobId) -> Result<()> {
        let dir = self.job_dir(id);
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| Error::Storage(format!("{}: {}", dir.display(), e)))?;
        debug!(job_id = %id, "Result record discarded");
        Ok(())
    }

    /// Overwrite the record for `job.id`.
    pub async fn update(&self, job: &Job) -> Result<()> {
        write_json(&self.record_path(&job.id), job).await?;
        debug!(job_id = %job.id, status = %job.status, "Result record updated");
        Ok(())
    }
}
