//! In-process task queue backed by a bounded channel and a fixed worker pool.

use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{Job, QueueError, TaskHandle, TaskId, TaskQueue};
use crate::{config::QueueConfig, db::store::DocumentStore, types::Record};

struct Submission {
    task_id: TaskId,
    job: Job,
    reply: oneshot::Sender<Result<Record, QueueError>>,
}

/// Runs jobs on at most `workers` concurrent tasks. At most `capacity` jobs wait for a worker.
#[derive(Clone)]
pub struct LocalTaskQueue {
    tx: mpsc::Sender<Submission>,
}

impl LocalTaskQueue {
    /// Create the queue and spawn its dispatcher on `tasks`.
    ///
    /// Once `shutdown` fires the queue stops accepting submissions, runs the ones already
    /// queued, and exits. Every worker is spawned on `tasks` too, so closing and waiting on
    /// the tracker waits until no job is left half done.
    pub fn spawn(store: Arc<dyn DocumentStore>, config: &QueueConfig, tasks: TaskTracker, shutdown: CancellationToken) -> Self {
        let (tx, rx) = mpsc::channel(config.capacity);
        tasks.spawn(run_dispatcher(rx, store, config.workers, tasks.clone(), shutdown));
        info!(workers = config.workers, capacity = config.capacity, "Task queue started");
        Self { tx }
    }
}

#[async_trait]
impl TaskQueue for LocalTaskQueue {
    async fn submit(&self, job: Job) -> Result<TaskHandle, QueueError> {
        let task_id = Uuid::new_v4();
        let (reply, outcome) = oneshot::channel();
        debug!(%task_id, job = %job, "Submitting task");

        self.tx
            .send(Submission { task_id, job, reply })
            .await
            .map_err(|_| QueueError::Closed)?;

        let outcome = async move { outcome.await.unwrap_or(Err(QueueError::Abandoned { task_id })) }.boxed();
        Ok(TaskHandle::new(task_id, outcome))
    }
}

/// Long-lived task that hands submissions to workers, capping concurrency with a semaphore.
async fn run_dispatcher(
    mut rx: mpsc::Receiver<Submission>,
    store: Arc<dyn DocumentStore>,
    workers: usize,
    tasks: TaskTracker,
    shutdown: CancellationToken,
) {
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut draining = false;

    loop {
        let submission = tokio::select! {
            submission = rx.recv() => {
                match submission {
                    Some(s) => s,
                    None => {
                        debug!("Task queue channel closed, shutting down");
                        break;
                    }
                }
            }
            _ = shutdown.cancelled(), if !draining => {
                // Closed receivers still yield what was buffered before the close
                info!("Task queue received shutdown signal, draining");
                rx.close();
                draining = true;
                continue;
            }
        };

        let permit = match semaphore.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => {
                warn!("Task queue semaphore closed");
                break;
            }
        };

        let store = store.clone();
        tasks.spawn(async move {
            let _permit = permit;
            let Submission { task_id, job, reply } = submission;
            let job_name = job.name();

            let result = job.run(store.as_ref()).await.map_err(|e| {
                warn!(%task_id, job = job_name, error = %e, "Task failed");
                QueueError::TaskFailed {
                    task_id,
                    message: e.to_string(),
                }
            });
            if result.is_ok() {
                debug!(%task_id, job = job_name, "Task completed");
            }

            if reply.send(result).is_err() {
                debug!(%task_id, "Task result discarded: submitter stopped waiting");
            }
        });
    }
}
