//! Fixed-size worker group draining a shared job queue.
//!
//! Jobs go through a bounded `async_channel`; every worker holds its own
//! clone of the receiver, so no worker blocks the others while waiting.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct WorkerPool {
    name: &'static str,
    size: usize,
}

impl WorkerPool {
    /// A pool of `size` workers; zero is treated as one.
    #[must_use]
    pub fn new(name: &'static str, size: usize) -> Self {
        Self {
            name,
            size: size.max(1),
        }
    }

    /// Runs `handler` over every job with at most `size` jobs in flight and
    /// returns the results in completion order.
    ///
    /// A job that panics yields no result. The panic is logged and a fresh
    /// worker takes the panicked worker's place so the queue is still drained.
    pub async fn run<J, R, F, Fut>(&self, jobs: Vec<J>, handler: F) -> Vec<R>
    where
        J: Send + 'static,
        R: Send + 'static,
        F: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        if jobs.is_empty() {
            return Vec::new();
        }

        let total = jobs.len();
        let initial = self.size.min(total);
        let (job_tx, job_rx) = async_channel::bounded::<J>(initial);
        let (result_tx, mut result_rx) = mpsc::unbounded_channel();
        let handler = Arc::new(handler);

        let mut workers = JoinSet::new();
        for _ in 0..initial {
            spawn_worker(
                &mut workers,
                job_rx.clone(),
                result_tx.clone(),
                Arc::clone(&handler),
            );
        }

        // Submission runs alongside the workers; dropping the sender closes
        // the queue once every job is handed out.
        let submitter = tokio::spawn(async move {
            for job in jobs {
                if job_tx.send(job).await.is_err() {
                    break;
                }
            }
        });

        debug!(pool = self.name, workers = initial, jobs = total, "Worker pool started");

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(pool = self.name, error = %e, "Worker task failed");
                if e.is_panic() {
                    spawn_worker(
                        &mut workers,
                        job_rx.clone(),
                        result_tx.clone(),
                        Arc::clone(&handler),
                    );
                }
            }
        }
        drop(result_tx);

        if let Err(e) = submitter.await {
            error!(pool = self.name, error = %e, "Job submission failed");
        }

        let mut results = Vec::with_capacity(total);
        while let Some(result) = result_rx.recv().await {
            results.push(result);
        }

        debug!(
            pool = self.name,
            completed = results.len(),
            jobs = total,
            "Worker pool drained"
        );

        results
    }
}

fn spawn_worker<J, R, F, Fut>(
    workers: &mut JoinSet<()>,
    queue: async_channel::Receiver<J>,
    results: mpsc::UnboundedSender<R>,
    handler: Arc<F>,
) where
    J: Send + 'static,
    R: Send + 'static,
    F: Fn(J) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    workers.spawn(async move {
        while let Ok(job) = queue.recv().await {
            if results.send(handler(job).await).is_err() {
                break;
            }
        }
    });
}
