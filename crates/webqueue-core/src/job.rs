//! The job record shared by the queue, the ledger and the result store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::JobId;

/// Caller-supplied job data. Opaque to the scheduler.
pub type Payload = Map<String, Value>;

/// Keys owned by the job record. They are stripped from submitted payloads
/// so the flattened wire form never carries duplicates.
pub const RESERVED_KEYS: &[&str] = &["id", "status", "error", "created_at", "finished_at"];

/// Status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted and waiting in the queue, or currently executing.
    Pending,
    /// Executor finished successfully.
    Done,
    /// Executor returned an error.
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        };
        f.pad(s)
    }
}

/// A unit of submitted work.
///
/// Serialized with the payload flattened beside the bookkeeping fields:
/// `{"name": "khawaja", "id": "…", "status": "pending", …}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub payload: Payload,
}

impl Job {
    /// Build a pending job with a fresh id from caller data.
    pub fn new(mut payload: Payload) -> Self {
        for key in RESERVED_KEYS {
            payload.remove(*key);
        }

        Self {
            id: JobId::new(),
            status: JobStatus::Pending,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
            payload,
        }
    }

    /// Mark the job done with the executor's final payload.
    pub fn complete(&mut self, mut payload: Payload) {
        for key in RESERVED_KEYS {
            payload.remove(*key);
        }
        self.payload = payload;
        self.status = JobStatus::Done;
        self.error = None;
        self.finished_at = Some(Utc::now());
    }

    /// Mark the job failed, keeping the submitted payload.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error = Some(message.into());
        self.finished_at = Some(Utc::now());
    }
}
