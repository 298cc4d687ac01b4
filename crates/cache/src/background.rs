//! Bounded background worker for fire-and-forget cache population.
//!
//! Cache repopulation after a store fallback must not block the request
//! that triggered it, and must keep running even if that request's task
//! goes away. Jobs are submitted to a bounded queue drained by a single
//! worker task; a full queue drops the job (the cache simply stays cold
//! until the next miss), and job failures land in the worker's log sink.

use std::future::Future;
use std::pin::Pin;

use sparrow_common::AppResult;
use tokio::sync::mpsc;
use tracing::warn;

type BackgroundJob = Pin<Box<dyn Future<Output = AppResult<()>> + Send>>;

/// Handle for submitting fire-and-forget cache tasks.
#[derive(Clone)]
pub struct BackgroundTasks {
    tx: mpsc::Sender<BackgroundJob>,
}

impl BackgroundTasks {
    /// Start the worker with a bounded queue of the given capacity.
    #[must_use]
    pub fn start(capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<BackgroundJob>(capacity);

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                if let Err(e) = job.await {
                    warn!(error = %e, "Background cache task failed");
                }
            }
        });

        Self { tx }
    }

    /// Submit a job. Best-effort: a full queue drops the job with a warning.
    pub fn submit<F>(&self, job: F)
    where
        F: Future<Output = AppResult<()>> + Send + 'static,
    {
        if self.tx.try_send(Box::pin(job)).is_err() {
            warn!("Background queue full, dropping cache population task");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_submitted_jobs_run() {
        let tasks = BackgroundTasks::start(8);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            tasks.submit(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failing_job_does_not_stop_worker() {
        let tasks = BackgroundTasks::start(8);
        let counter = Arc::new(AtomicUsize::new(0));

        tasks.submit(async move { Err(sparrow_common::AppError::Cache("boom".to_string())) });

        let after = Arc::clone(&counter);
        tasks.submit(async move {
            after.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
