//! Scheduler - accepts jobs and answers queries about them.
//!
//! Submission order: result record, ledger entry, queue entry. The record
//! exists before the job can be seen in the queue, so polling right after a
//! submit never misses it.
//!
//! Acceptance runs on its own task, so a caller that stops waiting (a dropped
//! HTTP connection, a timeout) cannot leave a job in the ledger that never
//! reached the queue.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use webqueue_core::{Error, Job, JobId, Payload, Result};

use crate::ledger::QueueLedger;
use crate::queue::WorkQueue;
use crate::store::ResultStore;

pub struct Scheduler {
    shared: Arc<Shared>,
}

struct Shared {
    store: ResultStore,
    /// Ledger critical section. Held only for a read-mutate-write cycle.
    ledger: Mutex<QueueLedger>,
    /// Serializes "append to ledger, push to queue" across submitters so both
    /// see jobs in the same order. The worker never takes it.
    submit_gate: Mutex<()>,
    queue: WorkQueue,
}

impl Shared {
    /// Record, ledger entry, queue entry. Runs to completion once started.
    async fn accept(&self, job: Job) -> Result<Job> {
        self.store.create(&job).await?;

        let _gate = self.submit_gate.lock().await;
        {
            let mut ledger = self.ledger.lock().await;
            debug!(job_id = %job.id, "Ledger locked");
            if let Err(e) = ledger.append(&job).await {
                drop(ledger);
                if let Err(discard_err) = self.store.discard(&job.id).await {
                    warn!(
                        job_id = %job.id,
                        error = %discard_err,
                        "Failed to discard result record"
                    );
                }
                return Err(e);
            }
        }
        debug!(job_id = %job.id, "Ledger unlocked");
        self.queue.push(job.clone());

        Ok(job)
    }
}

impl Scheduler {
    /// Open the scheduler over an existing (or new) ledger and result root,
    /// restoring any jobs the ledger still holds.
    ///
    /// An unreadable ledger is an error; callers treat it as fatal.
    pub async fn open(
        ledger_path: impl Into<PathBuf>,
        results_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let mut ledger = QueueLedger::new(ledger_path);
        ledger.init().await?;

        let scheduler = Self {
            shared: Arc::new(Shared {
                store: ResultStore::new(results_dir),
                ledger: Mutex::new(ledger),
                submit_gate: Mutex::new(()),
                queue: WorkQueue::new(),
            }),
        };

        let restored = scheduler.restore().await?;
        info!(restored, "Scheduler ready");
        Ok(scheduler)
    }

    /// Load the ledger and enqueue every entry, head first.
    ///
    /// Records and ledger entries already exist for these jobs, so neither
    /// is written again.
    async fn restore(&self) -> Result<usize> {
        let jobs = self.shared.ledger.lock().await.load().await?;
        let count = jobs.len();
        info!(count, "Loading work from ledger");
        for job in jobs {
            debug!(job_id = %job.id, "Restored job");
            self.shared.queue.push(job);
        }
        Ok(count)
    }

    /// Accept a new job. Returns as soon as the job is queued.
    pub async fn submit(&self, payload: Payload) -> Result<Job> {
        let job = Job::new(payload);
        info!(job_id = %job.id, "Received work");

        let shared = self.shared.clone();
        tokio::spawn(async move { shared.accept(job).await })
            .await
            .map_err(|e| Error::Internal(format!("submission task failed: {}", e)))?
    }

    /// Snapshot of the pending jobs, in execution order.
    pub fn list_pending(&self) -> Vec<Job> {
        let jobs = self.shared.queue.snapshot();
        for job in &jobs {
            debug!(job_id = %job.id, "Pending");
        }
        jobs
    }

    /// Current record for a job.
    pub async fn result(&self, id: &JobId) -> Result<Job> {
        info!(job_id = %id, "Getting result");
        self.shared
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("job {}", id)))
    }

    /// Removing queued work is not supported. Always returns `false` and
    /// leaves the queue untouched.
    pub fn remove(&self, id: &JobId) -> bool {
        debug!(job_id = %id, "Ignoring remove request; removal is not supported");
        false
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.shared.queue
    }

    /// Remove a dequeued job from the ledger, in the ledger critical section.
    pub(crate) async fn release_from_ledger(&self, id: &JobId) -> Result<Option<Job>> {
        let mut ledger = self.shared.ledger.lock().await;
        ledger.pop_front(id).await
    }

    pub(crate) async fn record(&self, job: &Job) -> Result<()> {
        self.shared.store.update(job).await
    }

    /// Persisted ledger contents, for parity checks.
    pub async fn ledger_snapshot(&self) -> Result<Vec<Job>> {
        self.shared.ledger.lock().await.load().await
    }
}
