//! Worker that drains the queue, one job at a time.

use crate::scheduler::Scheduler;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use webqueue_core::{Executor, Job};

/// The single consumer of the work queue.
pub struct Worker {
    scheduler: Arc<Scheduler>,
    executor: Arc<dyn Executor>,
}

impl Worker {
    pub fn new(scheduler: Arc<Scheduler>, executor: Arc<dyn Executor>) -> Self {
        Self {
            scheduler,
            executor,
        }
    }

    /// Run the worker on its own task.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Run the worker loop until `shutdown` is cancelled.
    ///
    /// Shutdown is only observed while waiting for work; a job that has
    /// started always runs to completion first.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(executor = self.executor.name(), "Starting worker");

        loop {
            let job = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Worker shutting down");
                    return;
                }
                job = self.scheduler.queue().pop() => job,
            };

            self.process(job).await;
        }
    }

    async fn process(&self, mut job: Job) {
        info!(job_id = %job.id, "Working on job");

        // Dropped from the ledger before execution: a crash mid-job loses it.
        if let Err(e) = self.scheduler.release_from_ledger(&job.id).await {
            // The entry stays in the ledger, so the job runs again after a restart.
            error!(job_id = %job.id, error = %e, "Failed to remove job from ledger");
        }

        match self.executor.execute(&job).await {
            Ok(payload) => job.complete(payload),
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Job failed");
                job.fail(e.to_string());
            }
        }

        match self.scheduler.record(&job).await {
            Ok(()) => info!(job_id = %job.id, status = %job.status, "Job finished"),
            Err(e) => error!(job_id = %job.id, error = %e, "Failed to write job result"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::{TempDir, tempdir};
    use webqueue_core::{DelayExecutor, Error, JobId, JobStatus, Payload, Result};

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    async fn open_in(dir: &TempDir) -> Arc<Scheduler> {
        Arc::new(
            Scheduler::open(dir.path().join("qu.json"), dir.path().join("results"))
                .await
                .unwrap(),
        )
    }

    async fn wait_for_status(scheduler: &Scheduler, id: &JobId, status: JobStatus) -> Job {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let job = scheduler.result(id).await.unwrap();
                if job.status == status {
                    return job;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap()
    }

    /// Records the order jobs were executed in and tracks overlap.
    #[derive(Default)]
    struct RecordingExecutor {
        seen: Mutex<Vec<JobId>>,
        running: Mutex<usize>,
        max_running: Mutex<usize>,
    }

    #[async_trait]
    impl Executor for RecordingExecutor {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn execute(&self, job: &Job) -> Result<Payload> {
            {
                let mut running = self.running.lock().unwrap();
                *running += 1;
                let mut max = self.max_running.lock().unwrap();
                *max = (*max).max(*running);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.seen.lock().unwrap().push(job.id);
            *self.running.lock().unwrap() -= 1;

            let mut out = job.payload.clone();
            out.insert("executed".to_string(), json!(true));
            Ok(out)
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl Executor for FailingExecutor {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn execute(&self, _job: &Job) -> Result<Payload> {
            Err(Error::ExecutionFailed("exit status 3".to_string()))
        }
    }

    #[tokio::test]
    async fn test_job_completes_after_delay() {
        let dir = tempdir().unwrap();
        let scheduler = open_in(&dir).await;
        let executor = Arc::new(DelayExecutor::new(Duration::from_millis(20)));
        let shutdown = CancellationToken::new();
        let handle = Worker::new(scheduler.clone(), executor).spawn(shutdown.clone());

        let job = scheduler
            .submit(payload(json!({"name": "khawaja"})))
            .await
            .unwrap();
        let done = wait_for_status(&scheduler, &job.id, JobStatus::Done).await;

        assert_eq!(done.payload["name"], "khawaja");
        assert!(done.finished_at.is_some());
        assert!(scheduler.list_pending().is_empty());
        assert!(scheduler.ledger_snapshot().await.unwrap().is_empty());

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_jobs_execute_in_submit_order_one_at_a_time() {
        let dir = tempdir().unwrap();
        let scheduler = open_in(&dir).await;
        let executor = Arc::new(RecordingExecutor::default());

        let mut ids = Vec::new();
        for n in 0..5 {
            ids.push(scheduler.submit(payload(json!({"n": n}))).await.unwrap().id);
        }

        let shutdown = CancellationToken::new();
        let handle = Worker::new(scheduler.clone(), executor.clone()).spawn(shutdown.clone());

        let last = wait_for_status(&scheduler, &ids[4], JobStatus::Done).await;
        assert_eq!(last.payload["executed"], true);
        assert_eq!(*executor.seen.lock().unwrap(), ids);
        assert_eq!(*executor.max_running.lock().unwrap(), 1);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_executor_error_marks_job_failed() {
        let dir = tempdir().unwrap();
        let scheduler = open_in(&dir).await;
        let shutdown = CancellationToken::new();
        let handle =
            Worker::new(scheduler.clone(), Arc::new(FailingExecutor)).spawn(shutdown.clone());

        let job = scheduler.submit(payload(json!({"n": 1}))).await.unwrap();
        let failed = wait_for_status(&scheduler, &job.id, JobStatus::Failed).await;

        assert_eq!(
            failed.error.as_deref(),
            Some("execution failed: exit status 3")
        );
        assert_eq!(failed.payload["n"], 1);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_drains_restored_jobs() {
        let dir = tempdir().unwrap();
        let id = {
            let scheduler = open_in(&dir).await;
            scheduler.submit(payload(json!({"n": 1}))).await.unwrap().id
        };

        let scheduler = open_in(&dir).await;
        let shutdown = CancellationToken::new();
        let executor = Arc::new(DelayExecutor::new(Duration::from_millis(1)));
        let handle = Worker::new(scheduler.clone(), executor).spawn(shutdown.clone());

        wait_for_status(&scheduler, &id, JobStatus::Done).await;

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_unwritable_ledger_does_not_stop_execution() {
        let dir = tempdir().unwrap();
        let scheduler = open_in(&dir).await;
        let first = scheduler.submit(payload(json!({"n": 1}))).await.unwrap();
        let second = scheduler.submit(payload(json!({"n": 2}))).await.unwrap();

        let ledger = dir.path().join("qu.json");
        std::fs::remove_file(&ledger).unwrap();
        std::fs::create_dir(&ledger).unwrap();

        let shutdown = CancellationToken::new();
        let executor = Arc::new(DelayExecutor::new(Duration::from_millis(1)));
        let handle = Worker::new(scheduler.clone(), executor).spawn(shutdown.clone());

        wait_for_status(&scheduler, &first.id, JobStatus::Done).await;
        wait_for_status(&scheduler, &second.id, JobStatus::Done).await;
        assert!(scheduler.list_pending().is_empty());

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_while_idle() {
        let dir = tempdir().unwrap();
        let scheduler = open_in(&dir).await;
        let shutdown = CancellationToken::new();
        let handle = Worker::new(scheduler, Arc::new(DelayExecutor::default()))
            .spawn(shutdown.clone());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
